//! Maps a parsed payment event onto the state change it calls for.
//!
//! Everything here is pure; `PaymentWebhookService` executes the result.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dto::stripe_event_dto::{CheckoutSession, ConnectedAccount, PaymentEvent, PaymentIntent};
use crate::models::company_profile::ConnectAccountStatus;
use crate::models::invoice::{InvoiceTransition, PAYMENT_METHOD_CARD};

pub const GENERIC_FAILURE_MESSAGE: &str =
    "A customer payment attempt failed. They may retry using the same payment link.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingInvoiceId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    MarkInvoicePaid {
        invoice_id: Uuid,
        transition: InvoiceTransition,
        session: CheckoutSession,
    },
    ClearPaymentLink {
        invoice_id: Uuid,
    },
    NotifyPaymentFailed {
        user_id: Option<Uuid>,
        invoice_id: Option<Uuid>,
        payment_intent_id: String,
        message: String,
    },
    UpdateAccountStatus {
        account_id: String,
        status: ConnectAccountStatus,
    },
    Skip(SkipReason),
    Unhandled(String),
}

pub fn reconcile(event: &PaymentEvent, now: DateTime<Utc>) -> Reconciliation {
    match event {
        PaymentEvent::CheckoutCompleted(session) => checkout_completed(session, now),
        PaymentEvent::CheckoutExpired(session) => match session.invoice_id() {
            Some(invoice_id) => Reconciliation::ClearPaymentLink { invoice_id },
            None => Reconciliation::Skip(SkipReason::MissingInvoiceId),
        },
        PaymentEvent::PaymentFailed(intent) => payment_failed(intent),
        PaymentEvent::AccountUpdated(account) => account_updated(account),
        PaymentEvent::Unhandled { event_type } => Reconciliation::Unhandled(event_type.clone()),
    }
}

fn checkout_completed(session: &CheckoutSession, now: DateTime<Utc>) -> Reconciliation {
    let Some(invoice_id) = session.invoice_id() else {
        return Reconciliation::Skip(SkipReason::MissingInvoiceId);
    };

    Reconciliation::MarkInvoicePaid {
        invoice_id,
        transition: InvoiceTransition::MarkPaid {
            paid_at: now,
            payment_method: PAYMENT_METHOD_CARD.to_string(),
            payment_reference: session.payment_reference(),
            payment_intent_id: session.payment_intent.clone(),
        },
        session: session.clone(),
    }
}

fn payment_failed(intent: &PaymentIntent) -> Reconciliation {
    Reconciliation::NotifyPaymentFailed {
        user_id: intent.metadata.user_id(),
        invoice_id: intent.metadata.invoice_id(),
        payment_intent_id: intent.id.clone(),
        message: intent
            .error_message()
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_string(),
    }
}

fn account_updated(account: &ConnectedAccount) -> Reconciliation {
    Reconciliation::UpdateAccountStatus {
        account_id: account.id.clone(),
        status: ConnectAccountStatus::derive(
            account.charges_enabled,
            account.payouts_enabled,
            account.disabled_reason(),
        ),
    }
}
