pub mod health;
pub mod job_feed;
pub mod openapi;
pub mod stripe_webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::middleware::rate_limit::{new_rps_state, rps_middleware};
use crate::AppState;

const WEBHOOK_BODY_LIMIT: usize = 256 * 1024;

pub fn router(state: AppState) -> Router {
    let base_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json));

    let webhook_api = Router::new()
        .route(
            "/api/webhooks/stripe-connect",
            post(stripe_webhook::handle_stripe_connect),
        )
        .layer(DefaultBodyLimit::max(WEBHOOK_BODY_LIMIT));

    let public_api = Router::new()
        .route("/api/jobs/feed", get(job_feed::get_job_feed))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(state.config.public_rps),
            rps_middleware,
        ));

    base_routes
        .merge(webhook_api)
        .merge(public_api)
        .with_state(state)
}
