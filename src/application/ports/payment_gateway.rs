use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_error::AppResult;

// ============================================================================
// Port Types - Provider-agnostic checkout types
// ============================================================================

/// Everything the provider needs to open a hosted checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub product_name: String,
    pub product_description: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

/// Provider view of a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionInfo {
    pub session_id: String,
    /// open | complete | expired
    pub status: String,
    /// paid | unpaid | no_payment_required
    pub payment_status: String,
    /// Minor units.
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Recurring subscription the session created, if any.
    #[serde(default)]
    pub subscription_id: Option<String>,
}

/// A verified provider notification.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn object_id(&self) -> Option<&str> {
        self.object["id"].as_str()
    }

    pub fn object_str(&self, field: &str) -> Option<&str> {
        self.object[field].as_str()
    }
}

// ============================================================================
// Port
// ============================================================================

/// Payment provider operations used by the subscription flow.
#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutSession>;

    async fn get_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSessionInfo>;

    /// Cancel a provider-side recurring subscription immediately.
    async fn cancel_subscription(&self, subscription_id: &str) -> AppResult<()>;

    /// Check the signature header against the raw body and parse the event.
    ///
    /// Returns `AppError::InvalidInput` for a bad signature or malformed payload.
    fn verify_webhook(&self, payload: &str, signature_header: &str) -> AppResult<WebhookEvent>;
}
