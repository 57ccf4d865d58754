use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::{
    dto::webhook_dto::{ErrorBody, WebhookAck},
    error::{Error, Result},
    AppState,
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[utoipa::path(
    post,
    path = "/api/webhooks/stripe-connect",
    request_body(content = String, description = "Raw provider event JSON", content_type = "application/json"),
    params(
        ("stripe-signature" = Option<String>, Header, description = "Provider signature header")
    ),
    responses(
        (status = 200, description = "Event received", body = WebhookAck),
        (status = 400, description = "Signature rejected", body = ErrorBody),
        (status = 500, description = "Configuration error or malformed event", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn handle_stripe_connect(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if state.config.stripe_secret_key.is_none() {
        return Err(Error::Config("STRIPE_SECRET_KEY is not configured".to_string()));
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let verified = state.event_verifier.verify(&body, signature)?;
    let outcome = state.webhook_service.process(&verified.event).await?;

    info!(
        event_type = verified.event.event_type(),
        ?outcome,
        "Webhook processed"
    );

    Ok(Json(WebhookAck::received(verified.event.event_type())))
}
