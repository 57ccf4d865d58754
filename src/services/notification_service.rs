use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::notification::{NewNotification, Notification};

pub const PUSH_FUNCTION: &str = "send-push-notification";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> Result<Notification>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: JsonValue,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: PushMessage) -> Result<()>;
}

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationService {
    #[instrument(skip(self, notification), fields(user_id = %notification.user_id, kind = notification.notification_type.as_str()))]
    async fn insert(&self, notification: NewNotification) -> Result<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, type, title, message, data, read)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING id, user_id, type, title, message, data, read, created_at
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

/// Dispatches push notifications through the hosted push function.
#[derive(Clone)]
pub struct PushService {
    client: Client,
    target_url: Option<url::Url>,
    service_key: Option<String>,
}

impl PushService {
    pub fn new(client: Client, target_url: Option<url::Url>, service_key: Option<String>) -> Self {
        Self {
            client,
            target_url,
            service_key,
        }
    }
}

#[async_trait]
impl PushSender for PushService {
    async fn send(&self, message: PushMessage) -> Result<()> {
        let Some(url) = &self.target_url else {
            return Err(Error::Config(
                "FUNCTIONS_BASE_URL is not set, push dispatch disabled".to_string(),
            ));
        };

        let mut request = self.client.post(url.clone()).json(&message);
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "push function returned {}: {}",
                status, body
            )));
        }

        debug!(user_id = %message.user_id, "Push notification dispatched");
        Ok(())
    }
}
