use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;

use crate::app_error::{AppError, AppResult};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Accepted clock skew between Stripe's signature timestamp and ours.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    api_base: String,
}

impl StripeClient {
    pub fn new(client: Client, secret_key: SecretString) -> Self {
        Self {
            client,
            secret_key,
            api_base: STRIPE_API_BASE.to_string(),
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    // ========================================================================
    // Checkout Sessions
    // ========================================================================

    /// One-off `payment` mode session with an inline price.
    pub async fn create_checkout_session(
        &self,
        input: &CheckoutSessionParams<'_>,
    ) -> AppResult<StripeCheckoutSession> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), input.success_url.to_string()),
            ("cancel_url".to_string(), input.cancel_url.to_string()),
            ("customer_email".to_string(), input.customer_email.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                input.currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                input.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                input.product_name.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                input.product_description.to_string(),
            ),
        ];

        if let Some(user_id) = input.metadata.get("user_id") {
            params.push(("client_reference_id".to_string(), user_id.clone()));
        }

        for (key, value) in input.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .header("Authorization", self.auth_header())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::upstream("Stripe request failed", e))?;

        self.handle_response(response).await
    }

    pub async fn get_checkout_session(&self, session_id: &str) -> AppResult<StripeCheckoutSession> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.api_base, session_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::upstream("Stripe request failed", e))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Cancels immediately.
    pub async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> AppResult<StripeSubscription> {
        let response = self
            .client
            .delete(format!("{}/subscriptions/{}", self.api_base, subscription_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::upstream("Stripe request failed", e))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Webhook Signature Verification
    // ========================================================================

    /// Checks a `stripe-signature` header (`t=<unix>,v1=<hex>,...`) against the raw body.
    pub fn verify_webhook_signature(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
        now_unix: i64,
    ) -> AppResult<()> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| AppError::InvalidInput("Missing timestamp in signature".into()))?;

        if signatures.is_empty() {
            return Err(AppError::InvalidInput("Missing signature".into()));
        }

        let signed_payload = format!("{}.{}", timestamp, payload);
        let mut mac = Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("HMAC error".into()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !signatures.iter().any(|sig| constant_time_compare(sig, &expected)) {
            return Err(AppError::InvalidInput("Invalid signature".into()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::InvalidInput("Invalid timestamp".into()))?;
        if (now_unix - ts).abs() > WEBHOOK_TOLERANCE_SECS {
            return Err(AppError::InvalidInput("Timestamp outside tolerance".into()));
        }

        Ok(())
    }

    /// Builds a header Stripe would send for `payload` at `timestamp`.
    pub fn sign_webhook_payload(payload: &str, webhook_secret: &str, timestamp: i64) -> String {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        // new_from_slice accepts keys of any length for HMAC
        let mut mac = match Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        format!(
            "t={},v1={}",
            timestamp,
            hex::encode(mac.finalize().into_bytes())
        )
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::upstream("Failed to read Stripe response", e))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(AppError::upstream("Stripe error", error.error.detail()));
            }

            return Err(AppError::upstream(
                "Stripe API error",
                format!("{} - {}", status, body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::upstream("Failed to parse Stripe response", e)
        })
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Everything `create_checkout_session` sends.
#[derive(Debug)]
pub struct CheckoutSessionParams<'a> {
    pub amount_cents: i64,
    pub currency: &'a str,
    pub product_name: &'a str,
    pub product_description: &'a str,
    pub customer_email: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub metadata: &'a HashMap<String, String>,
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
    /// open | complete | expired
    pub status: Option<String>,
    /// paid | unpaid | no_payment_required
    pub payment_status: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
    pub code: Option<String>,
}

impl StripeError {
    /// Message (or type when Stripe sent none) with the error code appended.
    pub fn detail(self) -> String {
        let message = self.message.unwrap_or(self.error_type);
        match self.code {
            Some(code) => format!("{} ({})", message, code),
            None => message,
        }
    }
}

// ============================================================================
// Webhook Event Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeWebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEventData {
    pub object: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const PAYLOAD: &str = r#"{"id":"evt_1","type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn accepts_fresh_valid_signature() {
        let header = StripeClient::sign_webhook_payload(PAYLOAD, SECRET, NOW);
        assert!(StripeClient::verify_webhook_signature(PAYLOAD, &header, SECRET, NOW + 10).is_ok());
    }

    #[test]
    fn accepts_when_any_v1_matches() {
        let valid = StripeClient::sign_webhook_payload(PAYLOAD, SECRET, NOW);
        let v1 = valid.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1=00ff,v0=abc,v1={}", NOW, v1);
        assert!(StripeClient::verify_webhook_signature(PAYLOAD, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = StripeClient::sign_webhook_payload(PAYLOAD, SECRET, NOW);
        let result =
            StripeClient::verify_webhook_signature(r#"{"id":"evt_2"}"#, &header, SECRET, NOW);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = StripeClient::sign_webhook_payload(PAYLOAD, "whsec_other", NOW);
        assert!(StripeClient::verify_webhook_signature(PAYLOAD, &header, SECRET, NOW).is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = StripeClient::sign_webhook_payload(PAYLOAD, SECRET, NOW);
        let result = StripeClient::verify_webhook_signature(
            PAYLOAD,
            &header,
            SECRET,
            NOW + WEBHOOK_TOLERANCE_SECS + 1,
        );
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(StripeClient::verify_webhook_signature(PAYLOAD, "", SECRET, NOW).is_err());
        assert!(StripeClient::verify_webhook_signature(PAYLOAD, "v1=abc", SECRET, NOW).is_err());
        assert!(StripeClient::verify_webhook_signature(PAYLOAD, "t=123", SECRET, NOW).is_err());
    }

    #[test]
    fn error_detail_carries_code() {
        let body = serde_json::json!({
            "error": {
                "type": "invalid_request_error",
                "message": "No such checkout.session",
                "code": "resource_missing",
            }
        });
        let error: StripeErrorResponse = serde_json::from_value(body).unwrap();
        assert_eq!(
            error.error.detail(),
            "No such checkout.session (resource_missing)"
        );

        let bare: StripeErrorResponse =
            serde_json::from_str(r#"{"error":{"type":"api_error"}}"#).unwrap();
        assert_eq!(bare.error.detail(), "api_error");
    }

    #[test]
    fn constant_time_compare_works() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
    }
}
