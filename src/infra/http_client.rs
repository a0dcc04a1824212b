//! Shared reqwest client construction.
//!
//! Outbound clients (Stripe, OpenAI, Walmart) are built here so every call has
//! a connect and a total timeout.

use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Stripe and Walmart answer within seconds.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat completions for a full recipe can take a while.
pub const GENERATION_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

pub fn build_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
}
