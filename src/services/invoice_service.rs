use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::models::invoice::{Invoice, InvoiceTransition};
use crate::utils::format::from_minor_units;

const INVOICE_COLUMNS: &str = "id, user_id, invoice_number, status, total, currency, client_data, \
     paid_at, payment_method, payment_reference, stripe_payment_intent_id, \
     stripe_payment_link_id, stripe_payment_link_url, created_at, updated_at";

/// Optional ledger entry written alongside a paid transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub amount_minor: Option<i64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Applies `transition` to the invoice atomically and returns the updated
    /// row, or `None` when no invoice has that id.
    async fn apply_transition(
        &self,
        invoice_id: Uuid,
        transition: InvoiceTransition,
        payment: Option<PaymentRecord>,
    ) -> Result<Option<Invoice>>;

    async fn find(&self, invoice_id: Uuid) -> Result<Option<Invoice>>;
}

#[derive(Clone)]
pub struct InvoiceService {
    pool: PgPool,
}

impl InvoiceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceStore for InvoiceService {
    #[instrument(skip(self, transition, payment))]
    async fn apply_transition(
        &self,
        invoice_id: Uuid,
        transition: InvoiceTransition,
        payment: Option<PaymentRecord>,
    ) -> Result<Option<Invoice>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = $1 FOR UPDATE",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let next = transition.apply(&current.payment_state());

        let updated = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = $2,
                paid_at = $3,
                payment_method = $4,
                payment_reference = $5,
                stripe_payment_intent_id = $6,
                stripe_payment_link_id = $7,
                stripe_payment_link_url = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(&next.status)
        .bind(next.paid_at)
        .bind(&next.payment_method)
        .bind(&next.payment_reference)
        .bind(&next.payment_intent_id)
        .bind(&next.payment_link_id)
        .bind(&next.payment_link_url)
        .fetch_one(&mut *tx)
        .await?;

        if let (true, Some(payment)) = (transition.marks_paid(), payment) {
            let amount = payment
                .amount_minor
                .map(from_minor_units)
                .unwrap_or(updated.total);
            let inserted = sqlx::query(
                r#"
                INSERT INTO invoice_payments (invoice_id, user_id, amount, payment_date, payment_method, payment_reference, notes)
                VALUES ($1, $2, $3, $4, $5, $6, 'Stripe Checkout')
                ON CONFLICT (payment_reference) DO NOTHING
                "#,
            )
            .bind(updated.id)
            .bind(updated.user_id)
            .bind(amount)
            .bind(updated.paid_at)
            .bind(&updated.payment_method)
            .bind(&updated.payment_reference)
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() == 0 {
                info!(%invoice_id, "Payment already recorded, ledger unchanged");
            }
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn find(&self, invoice_id: Uuid) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invoice)
    }
}
