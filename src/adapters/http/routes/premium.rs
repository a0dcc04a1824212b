//! Premium feature endpoints. All of them answer 402 before any paid-for call
//! when the user has no access.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::ports::premium::{DrinkPrompt, RecipePrompt},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/generate", post(generate_recipe))
        .route("/starbucks/generate", post(generate_drink))
        .route("/grocery/cart-options", post(cart_options))
}

#[derive(Deserialize)]
struct RecipePayload {
    user_id: Uuid,
    #[serde(flatten)]
    prompt: RecipePrompt,
}

#[derive(Deserialize)]
struct DrinkPayload {
    user_id: Uuid,
    #[serde(flatten)]
    prompt: DrinkPrompt,
}

#[derive(Deserialize)]
struct CartPayload {
    user_id: Uuid,
    ingredients: Vec<String>,
}

/// POST /api/recipes/generate
async fn generate_recipe(
    State(app_state): State<AppState>,
    Json(payload): Json<RecipePayload>,
) -> AppResult<impl IntoResponse> {
    let recipe = app_state
        .premium_use_cases
        .generate_recipe(payload.user_id, &payload.prompt)
        .await?;
    Ok(Json(recipe))
}

/// POST /api/starbucks/generate
async fn generate_drink(
    State(app_state): State<AppState>,
    Json(payload): Json<DrinkPayload>,
) -> AppResult<impl IntoResponse> {
    let drink = app_state
        .premium_use_cases
        .generate_drink(payload.user_id, &payload.prompt)
        .await?;
    Ok(Json(drink))
}

/// POST /api/grocery/cart-options
async fn cart_options(
    State(app_state): State<AppState>,
    Json(payload): Json<CartPayload>,
) -> AppResult<impl IntoResponse> {
    let cart = app_state
        .premium_use_cases
        .cart_options(payload.user_id, &payload.ingredients)
        .await?;
    Ok(Json(cart))
}
