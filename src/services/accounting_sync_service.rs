use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const ACCOUNTING_SYNC_FUNCTION: &str = "accounting-sync-invoice";

/// Ledgers the sync function knows how to push invoices into.
pub const SUPPORTED_PROVIDERS: &[&str] = &["xero", "quickbooks", "sage", "freeagent"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingSyncRequest {
    pub invoice_id: Uuid,
    pub provider: String,
    pub user_id: Uuid,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountingSync: Send + Sync {
    /// The most recently connected provider holding a token, if any.
    async fn connected_provider(&self, user_id: Uuid) -> Result<Option<String>>;

    async fn trigger_sync(&self, request: AccountingSyncRequest) -> Result<()>;
}

#[derive(Clone)]
pub struct AccountingSyncService {
    pool: PgPool,
    client: Client,
    target_url: Option<url::Url>,
    service_key: Option<String>,
}

impl AccountingSyncService {
    pub fn new(
        pool: PgPool,
        client: Client,
        target_url: Option<url::Url>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            pool,
            client,
            target_url,
            service_key,
        }
    }
}

#[async_trait]
impl AccountingSync for AccountingSyncService {
    async fn connected_provider(&self, user_id: Uuid) -> Result<Option<String>> {
        let providers: Vec<String> = SUPPORTED_PROVIDERS.iter().map(|p| p.to_string()).collect();
        let provider = sqlx::query_scalar::<_, String>(
            r#"
            SELECT provider
            FROM accounting_integrations
            WHERE user_id = $1
              AND access_token IS NOT NULL
              AND provider = ANY($2)
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(&providers)
        .fetch_optional(&self.pool)
        .await?;

        Ok(provider)
    }

    async fn trigger_sync(&self, request: AccountingSyncRequest) -> Result<()> {
        let Some(url) = &self.target_url else {
            return Err(Error::Config(
                "FUNCTIONS_BASE_URL is not set, accounting sync disabled".to_string(),
            ));
        };

        let mut builder = self.client.post(url.clone()).json(&request);
        if let Some(key) = &self.service_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "accounting sync returned {}: {}",
                status, body
            )));
        }

        info!(
            invoice_id = %request.invoice_id,
            provider = %request.provider,
            "Accounting sync triggered"
        );
        Ok(())
    }
}
