//! Combines employer-posted vacancies and aggregated listings into one feed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use crate::dto::job_feed_dto::{JobFeedQuery, JobFeedResponse, JobSource, UnifiedJobListing};
use crate::error::Result;
use crate::models::external_job::ExternalJob;
use crate::models::vacancy::EmployerVacancy;
use crate::services::external_job_service::{ExternalJobFilter, ExternalJobSource, ExternalSearchResult};
use crate::services::vacancy_service::{EmployerVacancyFilter, VacancySource};
use crate::utils::format::format_salary_range;
use crate::utils::job_relevance::is_electrical_job;
use crate::utils::time;

pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

pub fn employer_listing(vacancy: &EmployerVacancy) -> UnifiedJobListing {
    UnifiedJobListing {
        id: vacancy.id.to_string(),
        title: vacancy.title.clone(),
        company: vacancy.company_name.clone(),
        location: vacancy.location.clone(),
        salary: format_salary_range(vacancy.salary_min, vacancy.salary_max),
        job_type: vacancy.job_type.clone(),
        description: vacancy.description.clone(),
        url: vacancy.apply_url.clone(),
        posted_date: vacancy.created_at,
        source: JobSource::Employer,
        source_name: None,
        is_fresh: false,
    }
}

pub fn external_listing(job: &ExternalJob, now: DateTime<Utc>) -> UnifiedJobListing {
    UnifiedJobListing {
        id: job.id.clone(),
        title: job.title.clone(),
        company: job.company.clone(),
        location: job.location.clone(),
        salary: job.salary.clone().filter(|s| !s.trim().is_empty()),
        job_type: job.job_type.clone(),
        description: job.description.clone(),
        url: Some(job.external_url.clone()).filter(|u| !u.is_empty()),
        posted_date: job.posted_date,
        source: JobSource::External,
        source_name: job.source.clone(),
        is_fresh: job.updated_at.is_some_and(|at| {
            time::is_within(at, now, Duration::hours(FRESHNESS_WINDOW_HOURS))
        }),
    }
}

/// Case-insensitive job type match, the same comparison the cached query makes.
pub fn matches_job_type(job: &ExternalJob, job_type: Option<&str>) -> bool {
    job_type.map_or(true, |wanted| {
        job.job_type.trim().eq_ignore_ascii_case(wanted.trim())
    })
}

/// Keeps the first listing for each lower-cased, trimmed title and company.
pub fn dedupe_by_title_company(listings: Vec<UnifiedJobListing>) -> Vec<UnifiedJobListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| {
            seen.insert((
                listing.title.trim().to_lowercase(),
                listing.company.trim().to_lowercase(),
            ))
        })
        .collect()
}

/// One-based page slice. Out-of-range pages are empty.
pub fn paginate<T: Clone>(items: &[T], page: i64, per_page: i64) -> Vec<T> {
    let per_page = per_page.max(1) as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(per_page);
    items.iter().skip(start).take(per_page).cloned().collect()
}

pub fn total_pages(total: usize, per_page: i64) -> i64 {
    let per_page = per_page.max(1) as usize;
    total.div_ceil(per_page) as i64
}

/// Employer listings first, in their given order, then external listings.
pub fn merge_feed(
    employer: Vec<UnifiedJobListing>,
    external: Vec<UnifiedJobListing>,
) -> Vec<UnifiedJobListing> {
    let mut items = employer;
    items.extend(external);
    items
}

#[derive(Clone)]
pub struct JobFeedService {
    vacancies: Arc<dyn VacancySource>,
    external: Arc<dyn ExternalJobSource>,
}

impl JobFeedService {
    pub fn new(vacancies: Arc<dyn VacancySource>, external: Arc<dyn ExternalJobSource>) -> Self {
        Self {
            vacancies,
            external,
        }
    }

    #[instrument(skip(self, query), fields(source = ?query.source(), page = query.page()))]
    pub async fn feed(&self, query: &JobFeedQuery) -> Result<JobFeedResponse> {
        let source = query.source();
        let page = query.page();
        let per_page = query.per_page();
        let now = time::now();

        let employer: Vec<UnifiedJobListing> = if source.includes_employer() {
            self.vacancies
                .list_active(&EmployerVacancyFilter::from(query))
                .await?
                .iter()
                .map(employer_listing)
                .collect()
        } else {
            Vec::new()
        };

        let (external, last_updated) = if source.includes_external() {
            self.external_listings(query, now).await?
        } else {
            (Vec::new(), None)
        };

        let external_total = external.len();
        let employer_count = employer.len();
        let items = merge_feed(employer, paginate(&external, page, per_page));

        info!(employer_count, external_total, "Job feed assembled");

        Ok(JobFeedResponse {
            items,
            employer_count,
            external_total,
            page,
            per_page,
            total_pages: total_pages(external_total, per_page),
            last_updated,
        })
    }

    async fn external_listings(
        &self,
        query: &JobFeedQuery,
        now: DateTime<Utc>,
    ) -> Result<(Vec<UnifiedJobListing>, Option<DateTime<Utc>>)> {
        let filter = ExternalJobFilter {
            location: query.location_text(),
            job_type: query.job_type_text(),
        };

        let (result, searched): (ExternalSearchResult, bool) = match query.search_text() {
            Some(keywords) => match self.external.search(&keywords, filter.location.clone()).await {
                Ok(result) => (result, true),
                Err(e) => {
                    warn!(error = %e, "Live job search failed, serving cached listings");
                    (self.external.cached(&filter).await?, false)
                }
            },
            None => (self.external.cached(&filter).await?, false),
        };

        let listings: Vec<UnifiedJobListing> = result
            .jobs
            .iter()
            .filter(|job| !searched || matches_job_type(job, filter.job_type.as_deref()))
            .filter(|job| is_electrical_job(&job.title, &job.description))
            .map(|job| external_listing(job, now))
            .collect();

        let listings = if searched {
            dedupe_by_title_company(listings)
        } else {
            listings
        };

        Ok((listings, result.last_updated))
    }
}
