use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{adapters::http::app_state::AppState, app_error::AppResult};

pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(register))
}

#[derive(Deserialize)]
struct RegisterPayload {
    email: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    user_id: Uuid,
    trial_end_date: DateTime<Utc>,
}

/// POST /api/users
async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = app_state
        .subscription_use_cases
        .register(&payload.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            trial_end_date: user.trial_end_date,
        }),
    ))
}
