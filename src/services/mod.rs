pub mod accounting_sync_service;
pub mod email_service;
pub mod event_verifier;
pub mod external_job_service;
pub mod invoice_service;
pub mod job_feed_service;
pub mod notification_service;
pub mod payment_webhook_service;
pub mod profile_service;
pub mod reconciler;
pub mod vacancy_service;
