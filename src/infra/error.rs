use thiserror::Error;

/// Startup failures.
///
/// Display messages are safe for logs. Debug output includes the `#[source]` chain,
/// which may contain connection strings, so log with `%e`.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Database migration failed")]
    Migration(#[source] sqlx::migrate::MigrateError),

    #[error("Configuration error: environment variable {var} is invalid")]
    ConfigInvalid { var: &'static str },

    #[error("HTTP client initialization failed")]
    HttpClient(#[source] reqwest::Error),
}

impl From<sqlx::Error> for InfraError {
    fn from(e: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(e)
    }
}

impl From<sqlx::migrate::MigrateError> for InfraError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        InfraError::Migration(e)
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(e: reqwest::Error) -> Self {
        InfraError::HttpClient(e)
    }
}
