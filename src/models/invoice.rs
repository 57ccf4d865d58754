use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_PAID: &str = "paid";
pub const PAYMENT_METHOD_CARD: &str = "card";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub invoice_number: String,
    pub status: String,
    pub total: Decimal,
    pub currency: String,
    pub client_data: JsonValue,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_payment_link_id: Option<String>,
    pub stripe_payment_link_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Contact block stored on the invoice. Every field is optional because the
/// block is free-form JSON written by the quoting UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Invoice {
    pub fn client_contact(&self) -> ClientContact {
        serde_json::from_value(self.client_data.clone()).unwrap_or_default()
    }

    pub fn client_email(&self) -> Option<String> {
        self.client_contact()
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
    }

    pub fn payment_state(&self) -> InvoicePaymentState {
        InvoicePaymentState {
            status: self.status.clone(),
            paid_at: self.paid_at,
            payment_method: self.payment_method.clone(),
            payment_reference: self.payment_reference.clone(),
            payment_intent_id: self.stripe_payment_intent_id.clone(),
            payment_link_id: self.stripe_payment_link_id.clone(),
            payment_link_url: self.stripe_payment_link_url.clone(),
        }
    }

    pub fn with_payment_state(mut self, state: InvoicePaymentState) -> Self {
        self.status = state.status;
        self.paid_at = state.paid_at;
        self.payment_method = state.payment_method;
        self.payment_reference = state.payment_reference;
        self.stripe_payment_intent_id = state.payment_intent_id;
        self.stripe_payment_link_id = state.payment_link_id;
        self.stripe_payment_link_url = state.payment_link_url;
        self
    }
}

/// The subset of an invoice that payment events are allowed to touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePaymentState {
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_intent_id: Option<String>,
    pub payment_link_id: Option<String>,
    pub payment_link_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceTransition {
    MarkPaid {
        paid_at: DateTime<Utc>,
        payment_method: String,
        payment_reference: String,
        payment_intent_id: Option<String>,
    },
    ClearPaymentLink,
}

impl InvoiceTransition {
    pub fn apply(&self, state: &InvoicePaymentState) -> InvoicePaymentState {
        match self {
            InvoiceTransition::MarkPaid {
                paid_at,
                payment_method,
                payment_reference,
                payment_intent_id,
            } => InvoicePaymentState {
                status: STATUS_PAID.to_string(),
                paid_at: Some(*paid_at),
                payment_method: Some(payment_method.clone()),
                payment_reference: Some(payment_reference.clone()),
                payment_intent_id: payment_intent_id.clone(),
                ..state.clone()
            },
            InvoiceTransition::ClearPaymentLink => InvoicePaymentState {
                payment_link_id: None,
                payment_link_url: None,
                ..state.clone()
            },
        }
    }

    pub fn marks_paid(&self) -> bool {
        matches!(self, InvoiceTransition::MarkPaid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sent_with_link() -> InvoicePaymentState {
        InvoicePaymentState {
            status: "sent".into(),
            paid_at: None,
            payment_method: None,
            payment_reference: None,
            payment_intent_id: None,
            payment_link_id: Some("plink_123".into()),
            payment_link_url: Some("https://pay.example/plink_123".into()),
        }
    }

    fn mark_paid() -> InvoiceTransition {
        InvoiceTransition::MarkPaid {
            paid_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            payment_method: PAYMENT_METHOD_CARD.into(),
            payment_reference: "pi_123".into(),
            payment_intent_id: Some("pi_123".into()),
        }
    }

    #[test]
    fn mark_paid_sets_payment_fields() {
        let next = mark_paid().apply(&sent_with_link());
        assert_eq!(next.status, STATUS_PAID);
        assert!(next.paid_at.is_some());
        assert_eq!(next.payment_method.as_deref(), Some("card"));
        assert_eq!(next.payment_reference.as_deref(), Some("pi_123"));
        assert_eq!(next.payment_intent_id.as_deref(), Some("pi_123"));
        assert_eq!(next.payment_link_id.as_deref(), Some("plink_123"));
    }

    #[test]
    fn reapplying_mark_paid_is_stable() {
        let once = mark_paid().apply(&sent_with_link());
        let twice = mark_paid().apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn clearing_the_link_keeps_status() {
        let next = InvoiceTransition::ClearPaymentLink.apply(&sent_with_link());
        assert_eq!(next.status, "sent");
        assert_eq!(next.payment_link_id, None);
        assert_eq!(next.payment_link_url, None);
    }

    #[test]
    fn clearing_the_link_never_unpays() {
        let paid = mark_paid().apply(&sent_with_link());
        let next = InvoiceTransition::ClearPaymentLink.apply(&paid);
        assert_eq!(next.status, STATUS_PAID);
        assert_eq!(next.paid_at, paid.paid_at);
    }

    #[test]
    fn client_email_is_trimmed_and_optional() {
        let mut invoice = Invoice {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            invoice_number: "INV-001".into(),
            status: "sent".into(),
            total: Decimal::from(120),
            currency: "GBP".into(),
            client_data: serde_json::json!({ "name": "Ann", "email": "  ann@example.com " }),
            paid_at: None,
            payment_method: None,
            payment_reference: None,
            stripe_payment_intent_id: None,
            stripe_payment_link_id: None,
            stripe_payment_link_url: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(invoice.client_email().as_deref(), Some("ann@example.com"));

        invoice.client_data = serde_json::json!({ "name": "Ann", "email": "" });
        assert_eq!(invoice.client_email(), None);

        invoice.client_data = serde_json::json!("not an object");
        assert_eq!(invoice.client_email(), None);
    }
}
