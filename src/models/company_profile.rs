use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub stripe_account_id: Option<String>,
    pub stripe_account_status: Option<String>,
    pub stripe_account_updated_at: Option<DateTime<Utc>>,
}

/// Connected-account capability state as shown in business settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectAccountStatus {
    Active,
    Restricted,
    Pending,
}

impl ConnectAccountStatus {
    pub fn derive(charges_enabled: bool, payouts_enabled: bool, disabled_reason: Option<&str>) -> Self {
        if charges_enabled && payouts_enabled {
            ConnectAccountStatus::Active
        } else if disabled_reason.is_some_and(|reason| !reason.trim().is_empty()) {
            ConnectAccountStatus::Restricted
        } else {
            ConnectAccountStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectAccountStatus::Active => "active",
            ConnectAccountStatus::Restricted => "restricted",
            ConnectAccountStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for ConnectAccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
