use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::validators::is_valid_email,
    domain::entities::{package::Package, subscription_status::SubscriptionStatus},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/packages", get(list_packages))
        .route("/create-checkout", post(create_checkout))
        .route("/checkout/status/{session_id}", get(checkout_status))
        .route("/status/{user_id}", get(subscription_status))
        .route("/cancel/{user_id}", post(cancel))
        .route("/resubscribe/{user_id}", post(resubscribe))
}

#[derive(Serialize)]
struct PackagesResponse {
    packages: BTreeMap<&'static str, Package>,
}

#[derive(Deserialize)]
struct CreateCheckoutPayload {
    user_id: Uuid,
    user_email: String,
    origin_url: String,
}

#[derive(Deserialize, Default)]
struct CancelPayload {
    reason: Option<String>,
}

#[derive(Serialize)]
struct LifecycleResponse {
    status: SubscriptionStatus,
    message: &'static str,
}

/// GET /api/subscription/packages
async fn list_packages(State(app_state): State<AppState>) -> impl IntoResponse {
    let packages = app_state
        .checkout_use_cases
        .packages()
        .iter()
        .map(|p| (p.id, *p))
        .collect();
    Json(PackagesResponse { packages })
}

/// POST /api/subscription/create-checkout
async fn create_checkout(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCheckoutPayload>,
) -> AppResult<impl IntoResponse> {
    if !is_valid_email(&payload.user_email) {
        return Err(AppError::InvalidInput("Invalid user_email".into()));
    }

    let created = app_state
        .checkout_use_cases
        .create_checkout_session(payload.user_id, payload.user_email.trim(), &payload.origin_url)
        .await?;

    Ok(Json(created))
}

/// GET /api/subscription/checkout/status/{session_id}
async fn checkout_status(
    State(app_state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let status = app_state
        .checkout_use_cases
        .get_checkout_status(&session_id)
        .await?;
    Ok(Json(status))
}

/// GET /api/subscription/status/{user_id}
async fn subscription_status(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let status = app_state
        .subscription_use_cases
        .access_status(user_id)
        .await?;
    Ok(Json(status))
}

/// POST /api/subscription/cancel/{user_id}
///
/// Body is optional; `{"reason": "..."}` overrides the default reason.
async fn cancel(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
    payload: Option<Json<CancelPayload>>,
) -> AppResult<impl IntoResponse> {
    let reason = payload
        .and_then(|Json(p)| p.reason)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let user = app_state
        .subscription_use_cases
        .cancel(user_id, reason)
        .await?;

    Ok(Json(LifecycleResponse {
        status: user.subscription_status,
        message: "Subscription cancelled successfully",
    }))
}

/// POST /api/subscription/resubscribe/{user_id}
async fn resubscribe(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .subscription_use_cases
        .resubscribe(user_id)
        .await?;

    Ok(Json(LifecycleResponse {
        status: user.subscription_status,
        message: "Subscription reactivated, new trial started",
    }))
}
