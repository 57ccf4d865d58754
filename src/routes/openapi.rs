use axum::Json;
use utoipa::OpenApi;

use crate::dto::job_feed_dto::{JobFeedResponse, JobSource, JobSourceFilter, UnifiedJobListing};
use crate::dto::webhook_dto::{ErrorBody, WebhookAck};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::stripe_webhook::handle_stripe_connect,
        crate::routes::job_feed::get_job_feed,
    ),
    components(schemas(
        WebhookAck,
        ErrorBody,
        JobFeedResponse,
        UnifiedJobListing,
        JobSource,
        JobSourceFilter
    )),
    tags((name = "elecmate", description = "Payment webhooks and job feed"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
