use axum::{Router, http, routing::get};
use http::header::CONTENT_TYPE;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    adapters::{self, http::app_state::AppState},
    infra::setup::init_tracing,
};

pub fn create_app(app_state: AppState) -> Router {
    init_tracing();

    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", adapters::http::routes::router())
        .with_state(app_state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http-request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    request_id = %request_id
                )
            }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    use crate::test_utils::{TestAppStateBuilder, create_test_user};

    #[tokio::test]
    async fn health_and_security_headers() {
        let server = TestServer::new(create_app(TestAppStateBuilder::new().build())).unwrap();

        let response = server.get("/health").await;

        response.assert_status_ok();
        response.assert_text("ok");
        response.assert_header("x-content-type-options", "nosniff");
        response.assert_header("x-frame-options", "DENY");
    }

    #[tokio::test]
    async fn routes_are_nested_under_api() {
        let user = create_test_user(|_| {});
        let user_id = user.id;
        let app_state = TestAppStateBuilder::new().with_user(user).build();
        let server = TestServer::new(create_app(app_state)).unwrap();

        server
            .get(&format!("/api/subscription/status/{}", user_id))
            .await
            .assert_status_ok();
        server
            .get("/api/subscription/packages")
            .await
            .assert_status_ok();
    }
}
