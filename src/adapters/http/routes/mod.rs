pub mod premium;
pub mod subscription;
pub mod users;
pub mod webhook;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .nest("/subscription", subscription::router())
        .nest("/webhook", webhook::router())
        .merge(premium::router())
}
