use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_SESSION_EXPIRED: &str = "checkout.session.expired";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";
pub const ACCOUNT_UPDATED: &str = "account.updated";

/// Raw provider envelope as delivered on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: JsonValue,
}

/// Free-form metadata attached when the checkout or intent was created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Metadata(pub HashMap<String, String>);

impl Metadata {
    fn uuid(&self, key: &str) -> Option<Uuid> {
        self.0
            .get(key)
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    }

    pub fn invoice_id(&self) -> Option<Uuid> {
        self.uuid("invoice_id")
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.uuid("user_id")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CheckoutSession {
    pub fn invoice_id(&self) -> Option<Uuid> {
        self.metadata.invoice_id()
    }

    /// The intent id when the session created one, the session id otherwise.
    pub fn payment_reference(&self) -> String {
        self.payment_intent
            .clone()
            .filter(|pi| !pi.is_empty())
            .unwrap_or_else(|| self.id.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaymentError {
    pub message: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub last_payment_error: Option<PaymentError>,
}

impl PaymentIntent {
    pub fn error_message(&self) -> Option<&str> {
        self.last_payment_error
            .as_ref()
            .and_then(|err| err.message.as_deref())
            .filter(|msg| !msg.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountRequirements {
    pub disabled_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectedAccount {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
    #[serde(default)]
    pub requirements: Option<AccountRequirements>,
}

impl ConnectedAccount {
    pub fn disabled_reason(&self) -> Option<&str> {
        self.requirements
            .as_ref()
            .and_then(|r| r.disabled_reason.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    CheckoutCompleted(CheckoutSession),
    CheckoutExpired(CheckoutSession),
    PaymentFailed(PaymentIntent),
    AccountUpdated(ConnectedAccount),
    Unhandled { event_type: String },
}

impl PaymentEvent {
    pub fn event_type(&self) -> &str {
        match self {
            PaymentEvent::CheckoutCompleted(_) => CHECKOUT_SESSION_COMPLETED,
            PaymentEvent::CheckoutExpired(_) => CHECKOUT_SESSION_EXPIRED,
            PaymentEvent::PaymentFailed(_) => PAYMENT_INTENT_FAILED,
            PaymentEvent::AccountUpdated(_) => ACCOUNT_UPDATED,
            PaymentEvent::Unhandled { event_type } => event_type.as_str(),
        }
    }

    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: EventEnvelope = serde_json::from_slice(payload)?;
        Self::try_from(envelope)
    }
}

impl TryFrom<EventEnvelope> for PaymentEvent {
    type Error = serde_json::Error;

    fn try_from(envelope: EventEnvelope) -> Result<Self, Self::Error> {
        let object = envelope.data.object;
        let event = match envelope.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                PaymentEvent::CheckoutCompleted(serde_json::from_value(object)?)
            }
            CHECKOUT_SESSION_EXPIRED => PaymentEvent::CheckoutExpired(serde_json::from_value(object)?),
            PAYMENT_INTENT_FAILED => PaymentEvent::PaymentFailed(serde_json::from_value(object)?),
            ACCOUNT_UPDATED => PaymentEvent::AccountUpdated(serde_json::from_value(object)?),
            _ => PaymentEvent::Unhandled {
                event_type: envelope.event_type,
            },
        };
        Ok(event)
    }
}
