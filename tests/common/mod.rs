#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use elecmate_backend::{
    config::Config,
    error::{Error, Result},
    models::{
        company_profile::{CompanyProfile, ConnectAccountStatus},
        external_job::ExternalJob,
        invoice::{Invoice, InvoiceTransition},
        notification::{NewNotification, Notification},
        vacancy::EmployerVacancy,
    },
    routes,
    services::{
        accounting_sync_service::{AccountingSync, AccountingSyncRequest},
        email_service::{EmailSender, OutgoingEmail},
        external_job_service::{ExternalJobFilter, ExternalJobSource, ExternalSearchResult},
        invoice_service::{InvoiceStore, PaymentRecord},
        job_feed_service::JobFeedService,
        notification_service::{NotificationStore, PushMessage, PushSender},
        payment_webhook_service::PaymentWebhookService,
        profile_service::ProfileStore,
        vacancy_service::{EmployerVacancyFilter, VacancySource},
    },
    AppState,
};

pub const WEBHOOK_SECRET: &str = "whsec_integration";

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

#[derive(Default)]
pub struct FakeInvoices {
    pub rows: Mutex<HashMap<Uuid, Invoice>>,
    pub payments: Mutex<Vec<(Uuid, Option<PaymentRecord>)>>,
    pub writes: Mutex<usize>,
}

impl FakeInvoices {
    pub fn insert(&self, invoice: Invoice) {
        lock(&self.rows).insert(invoice.id, invoice);
    }

    pub fn get(&self, id: Uuid) -> Option<Invoice> {
        lock(&self.rows).get(&id).cloned()
    }

    pub fn writes(&self) -> usize {
        *lock(&self.writes)
    }
}

#[async_trait]
impl InvoiceStore for FakeInvoices {
    async fn apply_transition(
        &self,
        invoice_id: Uuid,
        transition: InvoiceTransition,
        payment: Option<PaymentRecord>,
    ) -> Result<Option<Invoice>> {
        let mut rows = lock(&self.rows);
        let Some(current) = rows.get(&invoice_id).cloned() else {
            return Ok(None);
        };
        let next = transition.apply(&current.payment_state());
        let updated = current.with_payment_state(next);
        rows.insert(invoice_id, updated.clone());
        *lock(&self.writes) += 1;
        if transition.marks_paid() {
            lock(&self.payments).push((invoice_id, payment));
        }
        Ok(Some(updated))
    }

    async fn find(&self, invoice_id: Uuid) -> Result<Option<Invoice>> {
        Ok(self.get(invoice_id))
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    pub rows: Mutex<Vec<CompanyProfile>>,
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn update_connect_status(
        &self,
        account_id: &str,
        status: ConnectAccountStatus,
    ) -> Result<u64> {
        let mut updated = 0;
        for profile in lock(&self.rows).iter_mut() {
            if profile.stripe_account_id.as_deref() == Some(account_id) {
                profile.stripe_account_status = Some(status.as_str().to_string());
                profile.stripe_account_updated_at = Some(Utc::now());
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<CompanyProfile>> {
        Ok(lock(&self.rows).iter().find(|p| p.user_id == user_id).cloned())
    }
}

#[derive(Default)]
pub struct FakeNotifications {
    pub rows: Mutex<Vec<NewNotification>>,
}

impl FakeNotifications {
    pub fn all(&self) -> Vec<NewNotification> {
        lock(&self.rows).clone()
    }
}

#[async_trait]
impl NotificationStore for FakeNotifications {
    async fn insert(&self, notification: NewNotification) -> Result<Notification> {
        lock(&self.rows).push(notification.clone());
        Ok(Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            notification_type: notification.notification_type.as_str().to_string(),
            title: notification.title,
            message: notification.message,
            data: notification.data,
            read: false,
            created_at: Some(Utc::now()),
        })
    }
}

#[derive(Default)]
pub struct FakePush {
    pub fail: bool,
    pub sent: Mutex<Vec<PushMessage>>,
}

#[async_trait]
impl PushSender for FakePush {
    async fn send(&self, message: PushMessage) -> Result<()> {
        lock(&self.sent).push(message);
        if self.fail {
            return Err(Error::Upstream("push service unavailable".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAccounting {
    pub provider: Option<String>,
    pub fail: bool,
    pub calls: Mutex<Vec<AccountingSyncRequest>>,
}

#[async_trait]
impl AccountingSync for FakeAccounting {
    async fn connected_provider(&self, _user_id: Uuid) -> Result<Option<String>> {
        Ok(self.provider.clone())
    }

    async fn trigger_sync(&self, request: AccountingSyncRequest) -> Result<()> {
        lock(&self.calls).push(request);
        if self.fail {
            return Err(Error::Upstream("sync function returned 500".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeEmail {
    pub fail: bool,
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailSender for FakeEmail {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        lock(&self.sent).push(email);
        if self.fail {
            return Err(Error::Upstream("email provider rejected message".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeVacancies {
    pub rows: Vec<EmployerVacancy>,
}

#[async_trait]
impl VacancySource for FakeVacancies {
    async fn list_active(&self, _filter: &EmployerVacancyFilter) -> Result<Vec<EmployerVacancy>> {
        Ok(self.rows.clone())
    }
}

#[derive(Default)]
pub struct FakeExternalJobs {
    pub cached: Vec<ExternalJob>,
    pub live: Option<Vec<ExternalJob>>,
    pub searches: Mutex<Vec<String>>,
}

#[async_trait]
impl ExternalJobSource for FakeExternalJobs {
    async fn cached(&self, _filter: &ExternalJobFilter) -> Result<ExternalSearchResult> {
        Ok(ExternalSearchResult {
            jobs: self.cached.clone(),
            last_updated: None,
        })
    }

    async fn search(&self, keywords: &str, _location: Option<String>) -> Result<ExternalSearchResult> {
        lock(&self.searches).push(keywords.to_string());
        match &self.live {
            Some(jobs) => Ok(ExternalSearchResult {
                jobs: jobs.clone(),
                last_updated: Some(Utc::now()),
            }),
            None => Err(Error::Upstream("aggregator unavailable".into())),
        }
    }
}

pub struct Fakes {
    pub invoices: Arc<FakeInvoices>,
    pub profiles: Arc<FakeProfiles>,
    pub notifications: Arc<FakeNotifications>,
    pub push: Arc<FakePush>,
    pub accounting: Arc<FakeAccounting>,
    pub email: Arc<FakeEmail>,
    pub vacancies: Arc<FakeVacancies>,
    pub external: Arc<FakeExternalJobs>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            invoices: Arc::new(FakeInvoices::default()),
            profiles: Arc::new(FakeProfiles::default()),
            notifications: Arc::new(FakeNotifications::default()),
            push: Arc::new(FakePush::default()),
            accounting: Arc::new(FakeAccounting::default()),
            email: Arc::new(FakeEmail::default()),
            vacancies: Arc::new(FakeVacancies::default()),
            external: Arc::new(FakeExternalJobs::default()),
        }
    }
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("DATABASE_URL".to_string(), "postgres://localhost/unused".to_string()),
        ("STRIPE_SECRET_KEY".to_string(), "sk_test_123".to_string()),
        (
            "STRIPE_CONNECT_WEBHOOK_SECRET".to_string(),
            WEBHOOK_SECRET.to_string(),
        ),
        ("PUBLIC_RPS".to_string(), "1000".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|name| vars.get(name).cloned()).expect("test config")
}

pub fn build_app(fakes: &Fakes, config: Config) -> Router {
    let webhook_service = PaymentWebhookService::new(
        fakes.invoices.clone(),
        fakes.profiles.clone(),
        fakes.notifications.clone(),
        fakes.push.clone(),
        fakes.accounting.clone(),
        fakes.email.clone(),
    );
    let job_feed_service = JobFeedService::new(fakes.vacancies.clone(), fakes.external.clone());
    let state = AppState::from_parts(Arc::new(config), webhook_service, job_feed_service);
    routes::router(state)
}

pub fn sent_invoice(owner: Uuid) -> Invoice {
    Invoice {
        id: Uuid::new_v4(),
        user_id: owner,
        invoice_number: "INV-1001".into(),
        status: "sent".into(),
        total: Decimal::new(48_000, 2),
        currency: "GBP".into(),
        client_data: json!({ "name": "Pat Client", "email": "pat@example.com" }),
        paid_at: None,
        payment_method: None,
        payment_reference: None,
        stripe_payment_intent_id: None,
        stripe_payment_link_id: Some("plink_1".into()),
        stripe_payment_link_url: Some("https://pay.example/plink_1".into()),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

pub fn company_profile(owner: Uuid, account_id: &str) -> CompanyProfile {
    CompanyProfile {
        id: Uuid::new_v4(),
        user_id: owner,
        company_name: "Bright Sparks Ltd".into(),
        company_email: Some("hello@brightsparks.example".into()),
        company_phone: None,
        stripe_account_id: Some(account_id.to_string()),
        stripe_account_status: Some("pending".into()),
        stripe_account_updated_at: None,
    }
}

pub fn external_job(id: &str, title: &str, company: &str, updated_at: Option<DateTime<Utc>>) -> ExternalJob {
    ExternalJob {
        id: id.into(),
        title: title.into(),
        company: company.into(),
        location: "Manchester".into(),
        salary: None,
        job_type: "Full-time".into(),
        description: "Commercial electrical installation".into(),
        external_url: format!("https://jobs.example/{}", id),
        posted_date: Utc::now(),
        source: Some("indeed".into()),
        updated_at,
    }
}

pub fn employer_vacancy(title: &str) -> EmployerVacancy {
    EmployerVacancy {
        id: Uuid::new_v4(),
        employer_id: Uuid::new_v4(),
        title: title.into(),
        company_name: "Bright Sparks Ltd".into(),
        location: "Manchester".into(),
        job_type: "Full-time".into(),
        salary_min: Some(35_000),
        salary_max: None,
        description: "Join our team".into(),
        apply_url: None,
        status: "active".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
