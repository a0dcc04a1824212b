use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{
        CheckoutRequest, CheckoutSession, CheckoutSessionInfo, PaymentGatewayPort, WebhookEvent,
    },
    infra::stripe_client::{CheckoutSessionParams, StripeClient, StripeWebhookEvent},
};

/// Adapter that wraps StripeClient to implement PaymentGatewayPort.
#[derive(Clone)]
pub struct StripePaymentAdapter {
    client: StripeClient,
    webhook_secret: SecretString,
}

impl StripePaymentAdapter {
    pub fn new(client: StripeClient, webhook_secret: SecretString) -> Self {
        Self {
            client,
            webhook_secret,
        }
    }
}

/// Parse a verified webhook body into the port's event type.
pub fn parse_webhook_event(payload: &str) -> AppResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_str(payload)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

    Ok(WebhookEvent {
        id: event.id,
        event_type: event.event_type,
        object: event.data.object,
    })
}

#[async_trait]
impl PaymentGatewayPort for StripePaymentAdapter {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutSession> {
        let session = self
            .client
            .create_checkout_session(&CheckoutSessionParams {
                amount_cents: request.amount_cents,
                currency: &request.currency,
                product_name: &request.product_name,
                product_description: &request.product_description,
                customer_email: &request.customer_email,
                success_url: &request.success_url,
                cancel_url: &request.cancel_url,
                metadata: &request.metadata,
            })
            .await?;

        let url = session
            .url
            .ok_or_else(|| AppError::upstream("Stripe error", "checkout session without url"))?;

        debug!(session_id = %session.id, "Stripe checkout session created");
        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }

    async fn get_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSessionInfo> {
        let session = self.client.get_checkout_session(session_id).await?;

        Ok(CheckoutSessionInfo {
            session_id: session.id,
            status: session.status.unwrap_or_else(|| "open".to_string()),
            payment_status: session.payment_status.unwrap_or_else(|| "unpaid".to_string()),
            amount_total: session.amount_total,
            currency: session.currency,
            metadata: session.metadata,
            subscription_id: session.subscription,
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> AppResult<()> {
        let subscription = self.client.cancel_subscription(subscription_id).await?;
        debug!(
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Stripe subscription cancelled"
        );
        Ok(())
    }

    fn verify_webhook(&self, payload: &str, signature_header: &str) -> AppResult<WebhookEvent> {
        StripeClient::verify_webhook_signature(
            payload,
            signature_header,
            self.webhook_secret.expose_secret(),
            Utc::now().timestamp(),
        )?;
        parse_webhook_event(payload)
    }
}
