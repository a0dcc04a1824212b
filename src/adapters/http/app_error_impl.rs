use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Expected rejections are not failures of the service.
        match &self {
            AppError::PaymentRequired(_) | AppError::Conflict(_) | AppError::NotFound(_) => {
                tracing::info!(error = %self, "Request rejected")
            }
            _ => tracing::error!(error = ?self, "Request failed"),
        }

        let code = self.code();
        match self {
            AppError::Database(_) => error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None),
            AppError::NotFound(msg) => error_resp(StatusCode::NOT_FOUND, code, Some(msg)),
            AppError::Conflict(msg) => error_resp(StatusCode::BAD_REQUEST, code, Some(msg)),
            AppError::PaymentRequired(status) => (
                StatusCode::PAYMENT_REQUIRED,
                Json(serde_json::json!({
                    "code": code.as_str(),
                    "message": "Premium subscription required",
                    "access_status": status,
                })),
            )
                .into_response(),
            AppError::Upstream { context, .. } => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                Some(context.to_string()),
            ),
            AppError::InvalidInput(msg) => error_resp(StatusCode::BAD_REQUEST, code, Some(msg)),
            AppError::Internal(_) => error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
