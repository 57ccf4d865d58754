use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::models::external_job::ExternalJob;

pub const LIVE_SEARCH_FUNCTION: &str = "live-job-aggregator";

/// Cap on cached rows pulled per request.
const CACHE_LIMIT: i64 = 500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalJobFilter {
    pub location: Option<String>,
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSearchResult {
    #[serde(default)]
    pub jobs: Vec<ExternalJob>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct LiveSearchRequest<'a> {
    keywords: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalJobSource: Send + Sync {
    /// Listings from the local aggregator cache.
    async fn cached(&self, filter: &ExternalJobFilter) -> Result<ExternalSearchResult>;

    /// Live keyword search through the aggregator function.
    async fn search(&self, keywords: &str, location: Option<String>) -> Result<ExternalSearchResult>;
}

#[derive(Clone)]
pub struct ExternalJobService {
    pool: PgPool,
    client: Client,
    search_url: Option<url::Url>,
    service_key: Option<String>,
}

impl ExternalJobService {
    pub fn new(
        pool: PgPool,
        client: Client,
        search_url: Option<url::Url>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            pool,
            client,
            search_url,
            service_key,
        }
    }
}

pub(crate) fn build_cached_query(filter: &ExternalJobFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT id::text AS id, title, company, location, salary, type, description, \
         external_url, posted_date, source, updated_at FROM job_listings WHERE TRUE",
    );
    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(job_type) = &filter.job_type {
        qb.push(" AND type ILIKE ").push_bind(job_type.clone());
    }
    qb.push(" ORDER BY posted_date DESC LIMIT ").push_bind(CACHE_LIMIT);
    qb
}

#[async_trait]
impl ExternalJobSource for ExternalJobService {
    async fn cached(&self, filter: &ExternalJobFilter) -> Result<ExternalSearchResult> {
        let mut qb = build_cached_query(filter);
        let jobs = qb
            .build_query_as::<ExternalJob>()
            .fetch_all(&self.pool)
            .await?;
        let last_updated = jobs.iter().map(ExternalJob::last_touched).max();
        Ok(ExternalSearchResult { jobs, last_updated })
    }

    #[instrument(skip(self))]
    async fn search(&self, keywords: &str, location: Option<String>) -> Result<ExternalSearchResult> {
        let Some(url) = &self.search_url else {
            return Err(Error::Config(
                "FUNCTIONS_BASE_URL is not set, live job search disabled".to_string(),
            ));
        };

        let mut request = self.client.post(url.clone()).json(&LiveSearchRequest {
            keywords,
            location: location.as_deref(),
        });
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "live job search returned {}: {}",
                status, body
            )));
        }

        let mut result = response.json::<ExternalSearchResult>().await?;
        if result.last_updated.is_none() {
            result.last_updated = result.jobs.iter().map(ExternalJob::last_touched).max();
        }
        info!(count = result.jobs.len(), "Live job search completed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_query_casts_ids_and_applies_filters() {
        let qb = build_cached_query(&ExternalJobFilter {
            location: Some("Bristol".into()),
            job_type: None,
        });
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT id::text AS id"));
        assert!(sql.contains("location ILIKE $1"));
        assert!(sql.contains("LIMIT $2"));
    }

    #[test]
    fn live_search_payload_parses_camel_case() {
        let result: ExternalSearchResult = serde_json::from_value(serde_json::json!({
            "jobs": [{
                "id": 7,
                "title": "Approved Electrician",
                "posted_date": "2025-03-01T09:00:00Z"
            }],
            "lastUpdated": "2025-03-02T10:00:00Z"
        }))
        .expect("parse");

        assert_eq!(result.jobs.len(), 1);
        assert_eq!(result.jobs[0].id, "7");
        assert!(result.last_updated.is_some());
    }
}
