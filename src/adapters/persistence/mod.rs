use sqlx::PgPool;

use crate::app_error::AppError;

pub mod payment_transaction;
pub mod user_subscription;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // PostgreSQL unique violation
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    AppError::Conflict("A record with this value already exists".into())
                }
                // PostgreSQL foreign key violation
                else if msg.contains("foreign key") {
                    AppError::InvalidInput("Referenced record not found".into())
                }
                // CHECK constraints guard date ordering on the subscription record
                else if msg.contains("check constraint") {
                    tracing::error!(error = ?err, "Check constraint violated");
                    AppError::Internal("Subscription dates out of order".into())
                } else {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
