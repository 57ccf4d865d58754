use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::job_feed_dto::{JobFeedQuery, JobFeedResponse},
    dto::webhook_dto::ErrorBody,
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/jobs/feed",
    params(JobFeedQuery),
    responses(
        (status = 200, description = "Employer listings followed by a page of external listings", body = JobFeedResponse),
        (status = 400, description = "Invalid filters", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn get_job_feed(
    State(state): State<AppState>,
    Query(query): Query<JobFeedQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    let feed = state.job_feed_service.feed(&query).await?;
    Ok(Json(feed))
}
