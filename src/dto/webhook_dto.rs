use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl WebhookAck {
    pub fn received(event_type: impl Into<String>) -> Self {
        Self {
            received: true,
            event_type: event_type.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
