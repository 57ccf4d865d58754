use std::future::Future;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::dto::stripe_event_dto::{CheckoutSession, PaymentEvent};
use crate::error::Result;
use crate::models::company_profile::ConnectAccountStatus;
use crate::models::invoice::{Invoice, InvoiceTransition};
use crate::models::notification::{NewNotification, NotificationType};
use crate::services::accounting_sync_service::{AccountingSync, AccountingSyncRequest};
use crate::services::email_service::{render_payment_confirmation, EmailSender};
use crate::services::invoice_service::{InvoiceStore, PaymentRecord};
use crate::services::notification_service::{NotificationStore, PushMessage, PushSender};
use crate::services::profile_service::ProfileStore;
use crate::services::reconciler::{reconcile, Reconciliation, SkipReason};
use crate::utils::format::format_money;
use crate::utils::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Skipped,
    Failed,
}

/// Result of each best-effort step that follows a paid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
    pub notification: StepStatus,
    pub push: StepStatus,
    pub accounting_sync: StepStatus,
    pub email: StepStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    InvoicePaid {
        invoice_id: Uuid,
        report: FanOutReport,
    },
    PaymentLinkCleared {
        invoice_id: Uuid,
    },
    InvoiceNotFound {
        invoice_id: Uuid,
    },
    PaymentFailureRecorded {
        user_id: Option<Uuid>,
        notification: StepStatus,
    },
    AccountStatusUpdated {
        account_id: String,
        status: ConnectAccountStatus,
        profiles_updated: u64,
    },
    Skipped(SkipReason),
    Unhandled(String),
}

async fn best_effort<T, F>(step: &'static str, fut: F) -> StepStatus
where
    F: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(_) => StepStatus::Done,
        Err(e) => {
            warn!(step, error = %e, "Best-effort step failed");
            StepStatus::Failed
        }
    }
}

/// Applies verified payment events to invoices and runs the follow-up steps.
#[derive(Clone)]
pub struct PaymentWebhookService {
    invoices: Arc<dyn InvoiceStore>,
    profiles: Arc<dyn ProfileStore>,
    notifications: Arc<dyn NotificationStore>,
    push: Arc<dyn PushSender>,
    accounting: Arc<dyn AccountingSync>,
    email: Arc<dyn EmailSender>,
}

impl PaymentWebhookService {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        profiles: Arc<dyn ProfileStore>,
        notifications: Arc<dyn NotificationStore>,
        push: Arc<dyn PushSender>,
        accounting: Arc<dyn AccountingSync>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            invoices,
            profiles,
            notifications,
            push,
            accounting,
            email,
        }
    }

    #[instrument(skip(self, event), fields(event_type = event.event_type()))]
    pub async fn process(&self, event: &PaymentEvent) -> Result<WebhookOutcome> {
        match reconcile(event, time::now()) {
            Reconciliation::MarkInvoicePaid {
                invoice_id,
                transition,
                session,
            } => self.mark_paid(invoice_id, transition, &session).await,
            Reconciliation::ClearPaymentLink { invoice_id } => {
                self.clear_payment_link(invoice_id).await
            }
            Reconciliation::NotifyPaymentFailed {
                user_id,
                invoice_id,
                payment_intent_id,
                message,
            } => {
                self.record_payment_failure(user_id, invoice_id, &payment_intent_id, message)
                    .await
            }
            Reconciliation::UpdateAccountStatus { account_id, status } => {
                let profiles_updated = self
                    .profiles
                    .update_connect_status(&account_id, status)
                    .await?;
                if profiles_updated == 0 {
                    warn!(%account_id, "No company profile linked to connected account");
                } else {
                    info!(%account_id, %status, "Connected account status updated");
                }
                Ok(WebhookOutcome::AccountStatusUpdated {
                    account_id,
                    status,
                    profiles_updated,
                })
            }
            Reconciliation::Skip(reason) => {
                warn!(?reason, "Event carries no invoice reference, ignoring");
                Ok(WebhookOutcome::Skipped(reason))
            }
            Reconciliation::Unhandled(event_type) => {
                info!(%event_type, "Unhandled event type");
                Ok(WebhookOutcome::Unhandled(event_type))
            }
        }
    }

    async fn mark_paid(
        &self,
        invoice_id: Uuid,
        transition: InvoiceTransition,
        session: &CheckoutSession,
    ) -> Result<WebhookOutcome> {
        let payment = PaymentRecord {
            amount_minor: session.amount_total,
        };
        let Some(invoice) = self
            .invoices
            .apply_transition(invoice_id, transition, Some(payment))
            .await?
        else {
            warn!(%invoice_id, "Invoice not found for completed checkout");
            return Ok(WebhookOutcome::InvoiceNotFound { invoice_id });
        };

        info!(%invoice_id, invoice_number = %invoice.invoice_number, "Invoice marked as paid");

        let (notification, push) = self.notify_payment_received(&invoice).await;
        let accounting_sync = self.trigger_accounting_sync(&invoice).await;
        let email = self.send_confirmation(&invoice).await;

        Ok(WebhookOutcome::InvoicePaid {
            invoice_id,
            report: FanOutReport {
                notification,
                push,
                accounting_sync,
                email,
            },
        })
    }

    async fn clear_payment_link(&self, invoice_id: Uuid) -> Result<WebhookOutcome> {
        match self
            .invoices
            .apply_transition(invoice_id, InvoiceTransition::ClearPaymentLink, None)
            .await?
        {
            Some(_) => {
                info!(%invoice_id, "Expired payment link cleared");
                Ok(WebhookOutcome::PaymentLinkCleared { invoice_id })
            }
            None => {
                warn!(%invoice_id, "Invoice not found for expired checkout");
                Ok(WebhookOutcome::InvoiceNotFound { invoice_id })
            }
        }
    }

    async fn notify_payment_received(&self, invoice: &Invoice) -> (StepStatus, StepStatus) {
        let amount = format_money(invoice.total, &invoice.currency);
        let title = "Payment received".to_string();
        let message = format!("Invoice {} has been paid ({})", invoice.invoice_number, amount);

        let notification = best_effort(
            "notification",
            self.notifications.insert(NewNotification {
                user_id: invoice.user_id,
                notification_type: NotificationType::PaymentReceived,
                title: title.clone(),
                message: message.clone(),
                data: json!({
                    "invoice_id": invoice.id,
                    "invoice_number": invoice.invoice_number,
                    "amount": invoice.total,
                    "payment_intent_id": invoice.stripe_payment_intent_id,
                }),
            }),
        )
        .await;

        let push = best_effort(
            "push",
            self.push.send(PushMessage {
                user_id: invoice.user_id,
                title,
                body: message,
                data: json!({
                    "type": NotificationType::PaymentReceived.as_str(),
                    "invoiceId": invoice.id,
                }),
            }),
        )
        .await;

        (notification, push)
    }

    async fn trigger_accounting_sync(&self, invoice: &Invoice) -> StepStatus {
        let provider = match self.accounting.connected_provider(invoice.user_id).await {
            Ok(Some(provider)) => provider,
            Ok(None) => return StepStatus::Skipped,
            Err(e) => {
                warn!(step = "accounting_sync", error = %e, "Accounting integration lookup failed");
                return StepStatus::Failed;
            }
        };

        best_effort(
            "accounting_sync",
            self.accounting.trigger_sync(AccountingSyncRequest {
                invoice_id: invoice.id,
                provider,
                user_id: invoice.user_id,
            }),
        )
        .await
    }

    async fn send_confirmation(&self, invoice: &Invoice) -> StepStatus {
        if invoice.client_email().is_none() {
            info!(invoice_id = %invoice.id, "No client email on invoice, confirmation skipped");
            return StepStatus::Skipped;
        }

        let profile = match self.profiles.find_by_user(invoice.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(step = "email", error = %e, "Company profile lookup failed, using fallback branding");
                None
            }
        };

        let paid_at = invoice.paid_at.unwrap_or_else(time::now);
        let Some(email) = render_payment_confirmation(invoice, profile.as_ref(), paid_at) else {
            return StepStatus::Skipped;
        };

        best_effort("email", self.email.send(email)).await
    }

    async fn record_payment_failure(
        &self,
        user_id: Option<Uuid>,
        invoice_id: Option<Uuid>,
        payment_intent_id: &str,
        message: String,
    ) -> Result<WebhookOutcome> {
        let owner = match (user_id, invoice_id) {
            (Some(user_id), _) => Some(user_id),
            (None, Some(invoice_id)) => match self.invoices.find(invoice_id).await {
                Ok(invoice) => invoice.map(|i| i.user_id),
                Err(e) => {
                    error!(%invoice_id, error = %e, "Invoice lookup for failed payment errored");
                    None
                }
            },
            (None, None) => None,
        };

        let Some(owner) = owner else {
            warn!(payment_intent_id, "Cannot resolve owner of failed payment, notification skipped");
            return Ok(WebhookOutcome::PaymentFailureRecorded {
                user_id: None,
                notification: StepStatus::Skipped,
            });
        };

        let notification = best_effort(
            "notification",
            self.notifications.insert(NewNotification {
                user_id: owner,
                notification_type: NotificationType::PaymentFailed,
                title: "Payment failed".to_string(),
                message,
                data: json!({
                    "invoice_id": invoice_id,
                    "payment_intent_id": payment_intent_id,
                }),
            }),
        )
        .await;

        Ok(WebhookOutcome::PaymentFailureRecorded {
            user_id: Some(owner),
            notification,
        })
    }
}
