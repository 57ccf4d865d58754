use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::dto::job_feed_dto::JobFeedQuery;
use crate::error::Result;
use crate::models::vacancy::{EmployerVacancy, STATUS_ACTIVE};

/// Filters applied to employer-posted vacancies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployerVacancyFilter {
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub search: Option<String>,
}

impl From<&JobFeedQuery> for EmployerVacancyFilter {
    fn from(query: &JobFeedQuery) -> Self {
        Self {
            location: query.location_text(),
            job_type: query.job_type_text(),
            salary_min: query.salary_min,
            salary_max: query.salary_max,
            search: query.search_text(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VacancySource: Send + Sync {
    /// Active vacancies matching `filter`, newest first.
    async fn list_active(&self, filter: &EmployerVacancyFilter) -> Result<Vec<EmployerVacancy>>;
}

#[derive(Clone)]
pub struct VacancyService {
    pool: PgPool,
}

impl VacancyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn build_active_query(filter: &EmployerVacancyFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT id, employer_id, title, company_name, location, job_type, salary_min, salary_max, \
         description, apply_url, status, created_at, updated_at \
         FROM employer_vacancies WHERE status = ",
    );
    qb.push_bind(STATUS_ACTIVE);

    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(job_type) = &filter.job_type {
        qb.push(" AND job_type ILIKE ").push_bind(job_type.clone());
    }
    if let Some(min) = filter.salary_min {
        qb.push(" AND COALESCE(salary_max, salary_min) >= ")
            .push_bind(min);
    }
    if let Some(max) = filter.salary_max {
        qb.push(" AND COALESCE(salary_min, salary_max) <= ")
            .push_bind(max);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    qb.push(" ORDER BY created_at DESC");
    qb
}

#[async_trait]
impl VacancySource for VacancyService {
    async fn list_active(&self, filter: &EmployerVacancyFilter) -> Result<Vec<EmployerVacancy>> {
        let mut qb = build_active_query(filter);
        let items = qb
            .build_query_as::<EmployerVacancy>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}
