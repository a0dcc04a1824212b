use thiserror::Error;

use crate::domain::{entitlement::AccessStatus, entities::user_subscription::LifecycleError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid state transition, e.g. cancelling without an active subscription.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment required")]
    PaymentRequired(Box<AccessStatus>),

    /// An external API call failed. Only `context` is shown to the client.
    #[error("{context}: {detail}")]
    Upstream { context: &'static str, detail: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn upstream(context: &'static str, detail: impl std::fmt::Display) -> Self {
        AppError::Upstream {
            context,
            detail: detail.to_string(),
        }
    }

    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::PaymentRequired(_) => ErrorCode::PaymentRequired,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    NotFound,
    Conflict,
    PaymentRequired,
    UpstreamError,
    InvalidInput,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::PaymentRequired => "PAYMENT_REQUIRED",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
