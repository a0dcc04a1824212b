use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;

use crate::infra::error::InfraError;

pub const DEFAULT_TRIAL_DAYS: i64 = 49;
const DEFAULT_WALMART_API_BASE: &str =
    "https://developer.api.walmart.com/api-proxy/service/affil/product/v2";

pub struct AppConfig {
    pub stripe_api_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    pub openai_api_key: SecretString,
    pub openai_model: String,
    pub walmart_api_key: SecretString,
    pub walmart_api_base: String,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Length of a trial, both at registration and on resubscribe.
    pub trial_days: i64,
    pub expiry_sweep_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let stripe_api_key = SecretString::from(get_env::<String>("STRIPE_API_KEY"));
        let stripe_webhook_secret = SecretString::from(get_env::<String>("STRIPE_WEBHOOK_SECRET"));
        let openai_api_key = SecretString::from(get_env::<String>("OPENAI_API_KEY"));
        let walmart_api_key = SecretString::from(get_env::<String>("WALMART_API_KEY"));
        let database_url: String = get_env("DATABASE_URL");

        let openai_model: String = get_env_default("OPENAI_MODEL", "gpt-4o-mini".to_string());
        let walmart_api_base: String =
            get_env_default("WALMART_API_BASE", DEFAULT_WALMART_API_BASE.to_string());

        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8001)));
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "CORS_ORIGIN" })?;

        let trial_days: i64 = get_env_default("TRIAL_DAYS", DEFAULT_TRIAL_DAYS);
        if trial_days <= 0 {
            return Err(InfraError::ConfigInvalid { var: "TRIAL_DAYS" });
        }
        let expiry_sweep_secs: u64 = get_env_default("EXPIRY_SWEEP_SECS", 3600);

        Ok(Self {
            stripe_api_key,
            stripe_webhook_secret,
            openai_api_key,
            openai_model,
            walmart_api_key,
            walmart_api_base,
            database_url,
            bind_addr,
            cors_origin,
            trial_days,
            expiry_sweep_secs,
        })
    }

    pub fn trial_length(&self) -> chrono::Duration {
        chrono::Duration::days(self.trial_days)
    }
}
