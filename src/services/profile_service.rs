use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::company_profile::{CompanyProfile, ConnectAccountStatus};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the number of profiles linked to `account_id` that were updated.
    async fn update_connect_status(
        &self,
        account_id: &str,
        status: ConnectAccountStatus,
    ) -> Result<u64>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<CompanyProfile>>;
}

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileService {
    async fn update_connect_status(
        &self,
        account_id: &str,
        status: ConnectAccountStatus,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE company_profiles
            SET stripe_account_status = $2,
                stripe_account_updated_at = NOW(),
                updated_at = NOW()
            WHERE stripe_account_id = $1
            "#,
        )
        .bind(account_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<CompanyProfile>> {
        let profile = sqlx::query_as::<_, CompanyProfile>(
            r#"
            SELECT id, user_id, company_name, company_email, company_phone,
                   stripe_account_id, stripe_account_status, stripe_account_updated_at
            FROM company_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
