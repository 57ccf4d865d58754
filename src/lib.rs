pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{
    accounting_sync_service::{AccountingSyncService, ACCOUNTING_SYNC_FUNCTION},
    email_service::ResendEmailSender,
    event_verifier::EventVerifier,
    external_job_service::{ExternalJobService, LIVE_SEARCH_FUNCTION},
    invoice_service::InvoiceService,
    job_feed_service::JobFeedService,
    notification_service::{NotificationService, PushService, PUSH_FUNCTION},
    payment_webhook_service::PaymentWebhookService,
    profile_service::ProfileService,
    vacancy_service::VacancyService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub event_verifier: EventVerifier,
    pub webhook_service: PaymentWebhookService,
    pub job_feed_service: JobFeedService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let webhook_service = PaymentWebhookService::new(
            Arc::new(InvoiceService::new(pool.clone())),
            Arc::new(ProfileService::new(pool.clone())),
            Arc::new(NotificationService::new(pool.clone())),
            Arc::new(PushService::new(
                http_client.clone(),
                config.function_url(PUSH_FUNCTION),
                config.service_role_key.clone(),
            )),
            Arc::new(AccountingSyncService::new(
                pool.clone(),
                http_client.clone(),
                config.function_url(ACCOUNTING_SYNC_FUNCTION),
                config.service_role_key.clone(),
            )),
            Arc::new(ResendEmailSender::new(
                http_client.clone(),
                config.resend_api_key.clone(),
                config.email_from.clone(),
            )),
        );

        let job_feed_service = JobFeedService::new(
            Arc::new(VacancyService::new(pool.clone())),
            Arc::new(ExternalJobService::new(
                pool,
                http_client,
                config.function_url(LIVE_SEARCH_FUNCTION),
                config.service_role_key.clone(),
            )),
        );

        Ok(Self::from_parts(config, webhook_service, job_feed_service))
    }

    /// Assembles state from prebuilt services, e.g. with in-memory stores.
    pub fn from_parts(
        config: Arc<Config>,
        webhook_service: PaymentWebhookService,
        job_feed_service: JobFeedService,
    ) -> Self {
        let event_verifier = EventVerifier::new(
            config.stripe_webhook_secret.clone(),
            config.signature_policy,
            config.signature_tolerance_secs,
        );
        Self {
            config,
            event_verifier,
            webhook_service,
            job_feed_service,
        }
    }
}
