//! Stripe webhook endpoint.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{error, info, warn};

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppError,
    use_cases::checkout::WebhookOutcome,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Whether Stripe should redeliver the event.
///
/// Transient failures answer 5xx so Stripe retries. Everything else is
/// acknowledged, since a redelivery would fail the same way.
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        AppError::Database(_) => true,
        AppError::Internal(_) => true,

        AppError::NotFound(_) => false,
        AppError::Conflict(_) => false,
        AppError::InvalidInput(_) => false,
        AppError::PaymentRequired(_) => false,
        AppError::Upstream { .. } => false,
    }
}

fn acknowledged() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "received": true }))).into_response()
}

/// POST /api/webhook/stripe
async fn handle_stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    match app_state
        .checkout_use_cases
        .handle_webhook(&body, signature)
        .await
    {
        Ok(outcome) => {
            if outcome == WebhookOutcome::Activated {
                info!("Subscription activated from webhook");
            }
            acknowledged()
        }
        // Bad signature or unparseable body: reject so misconfiguration is visible.
        Err(e @ AppError::InvalidInput(_)) => {
            warn!(error = %e, "Rejected webhook");
            e.into_response()
        }
        Err(e) if is_retryable_error(&e) => {
            error!(
                error = %e,
                retryable = true,
                "Webhook processing failed, returning 500 for Stripe retry"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            warn!(error = %e, retryable = false, "Webhook processing failed, acknowledging");
            acknowledged()
        }
    }
}
