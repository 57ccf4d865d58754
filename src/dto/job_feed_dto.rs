use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobSourceFilter {
    #[default]
    All,
    Employer,
    External,
}

impl JobSourceFilter {
    pub fn includes_employer(&self) -> bool {
        matches!(self, JobSourceFilter::All | JobSourceFilter::Employer)
    }

    pub fn includes_external(&self) -> bool {
        matches!(self, JobSourceFilter::All | JobSourceFilter::External)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_salary_bounds"))]
pub struct JobFeedQuery {
    /// Case-insensitive location fragment.
    pub location: Option<String>,
    pub job_type: Option<String>,
    #[validate(range(min = 0))]
    pub salary_min: Option<i32>,
    #[validate(range(min = 0))]
    pub salary_max: Option<i32>,
    /// Free-text search. Switches external listings to the live aggregator.
    pub q: Option<String>,
    pub source: Option<JobSourceFilter>,
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<i64>,
}

fn validate_salary_bounds(query: &JobFeedQuery) -> Result<(), ValidationError> {
    match (query.salary_min, query.salary_max) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("salary_min_exceeds_max")),
        _ => Ok(()),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl JobFeedQuery {
    pub fn search_text(&self) -> Option<String> {
        non_blank(&self.q)
    }

    pub fn location_text(&self) -> Option<String> {
        non_blank(&self.location)
    }

    pub fn job_type_text(&self) -> Option<String> {
        non_blank(&self.job_type)
    }

    pub fn source(&self) -> JobSourceFilter {
        self.source.unwrap_or_default()
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Employer,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UnifiedJobListing {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub job_type: String,
    pub description: String,
    pub url: Option<String>,
    pub posted_date: DateTime<Utc>,
    pub source: JobSource,
    /// Board the listing was aggregated from. Empty for employer listings.
    pub source_name: Option<String>,
    pub is_fresh: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobFeedResponse {
    pub items: Vec<UnifiedJobListing>,
    pub employer_count: usize,
    pub external_total: usize,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub last_updated: Option<DateTime<Utc>>,
}
