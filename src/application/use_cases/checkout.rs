use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{CheckoutRequest, PaymentGatewayPort, WebhookEvent},
        use_cases::subscription::UserSubscriptionRepo,
        validators::parse_origin,
    },
    domain::entities::{
        package::{self, MONTHLY_PREMIUM, Package, cents_to_decimal},
        payment_status::PaymentStatus,
        payment_transaction::{NewPaymentTransaction, PaymentTransaction},
        user_subscription::UserSubscription,
    },
};

#[async_trait]
pub trait PaymentTransactionRepo: Send + Sync {
    async fn create(&self, input: &NewPaymentTransaction) -> AppResult<PaymentTransaction>;
    async fn get_by_session_id(&self, session_id: &str) -> AppResult<Option<PaymentTransaction>>;
    /// Move a `pending` transaction to a final state other than `paid`.
    ///
    /// The update is conditional on the row still being pending, so of two racing
    /// callers only one sees `true`.
    async fn transition_from_pending(
        &self,
        id: Uuid,
        to: PaymentStatus,
        stripe_status: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;
    /// Mark a `pending` transaction `paid` (setting `completed_at`) and store the
    /// activated subscription in one database transaction.
    ///
    /// Returns `false` and writes nothing when the transaction is already settled.
    /// A failed user write leaves the transaction pending so a retry can settle it.
    async fn settle_paid(
        &self,
        id: Uuid,
        stripe_status: &str,
        at: DateTime<Utc>,
        activated: &UserSubscription,
    ) -> AppResult<bool>;
    async fn update_stripe_status(&self, id: Uuid, stripe_status: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutCreated {
    pub url: String,
    pub session_id: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStatus {
    pub session_id: String,
    pub status: String,
    pub payment_status: String,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: HashMap<String, String>,
    pub transaction_id: Uuid,
    pub transaction_status: PaymentStatus,
    pub user_id: Uuid,
}

/// What a webhook delivery led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Activated,
    TransactionUpdated,
    AlreadyProcessed,
    UnknownSession,
    Ignored,
}

/// Checkout creation, status polling, webhook confirmation and activation.
#[derive(Clone)]
pub struct CheckoutUseCases {
    user_repo: Arc<dyn UserSubscriptionRepo>,
    transaction_repo: Arc<dyn PaymentTransactionRepo>,
    payment_gateway: Arc<dyn PaymentGatewayPort>,
}

impl CheckoutUseCases {
    pub fn new(
        user_repo: Arc<dyn UserSubscriptionRepo>,
        transaction_repo: Arc<dyn PaymentTransactionRepo>,
        payment_gateway: Arc<dyn PaymentGatewayPort>,
    ) -> Self {
        Self {
            user_repo,
            transaction_repo,
            payment_gateway,
        }
    }

    pub fn packages(&self) -> &'static [Package] {
        package::catalog()
    }

    #[instrument(skip(self))]
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        user_email: &str,
        origin_url: &str,
    ) -> AppResult<CheckoutCreated> {
        let origin = parse_origin(origin_url)
            .ok_or_else(|| AppError::InvalidInput("Invalid origin_url".into()))?;

        let user = self
            .user_repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        if user.has_paid_period(Utc::now()) {
            return Err(AppError::Conflict(
                "User already has active subscription".into(),
            ));
        }

        let pkg = MONTHLY_PREMIUM;
        let metadata = HashMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("user_email".to_string(), user_email.to_string()),
            ("package_id".to_string(), pkg.id.to_string()),
        ]);

        let request = CheckoutRequest {
            amount_cents: pkg.amount_cents,
            currency: pkg.currency.to_string(),
            product_name: pkg.name.to_string(),
            product_description: pkg.description.to_string(),
            customer_email: user_email.to_string(),
            success_url: format!(
                "{}/subscription/success?session_id={{CHECKOUT_SESSION_ID}}",
                origin
            ),
            cancel_url: format!("{}/subscription/cancel", origin),
            metadata: metadata.clone(),
        };

        let session = self
            .payment_gateway
            .create_checkout_session(&request)
            .await
            .map_err(|e| {
                warn!(%user_id, error = %e, "Checkout session creation failed");
                AppError::upstream("Failed to create checkout", e)
            })?;

        // Recorded before the URL leaves the server so an abandoned tab still has a row.
        let transaction = self
            .transaction_repo
            .create(&NewPaymentTransaction {
                user_id,
                session_id: session.session_id.clone(),
                amount_cents: pkg.amount_cents,
                currency: pkg.currency.to_string(),
                package_id: pkg.id.to_string(),
                metadata: serde_json::to_value(&metadata).unwrap_or_default(),
            })
            .await?;

        info!(
            %user_id,
            session_id = %session.session_id,
            transaction_id = %transaction.id,
            "Checkout session created"
        );

        Ok(CheckoutCreated {
            url: session.url,
            session_id: session.session_id,
            amount: pkg.amount_decimal(),
            currency: pkg.currency.to_string(),
        })
    }

    /// Polls the provider (no local cache) and syncs the local transaction.
    #[instrument(skip(self))]
    pub async fn get_checkout_status(&self, session_id: &str) -> AppResult<CheckoutStatus> {
        let transaction = self
            .transaction_repo
            .get_by_session_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

        let session = self
            .payment_gateway
            .get_checkout_session(session_id)
            .await
            .map_err(|e| {
                warn!(session_id, error = %e, "Checkout status lookup failed");
                AppError::upstream("Failed to check status", e)
            })?;

        let observed = PaymentStatus::from_stripe_session(&session.status, &session.payment_status);
        let stripe_status = format!("{}/{}", session.status, session.payment_status);

        let transaction_status = if observed != transaction.payment_status {
            self.apply_status(
                &transaction,
                observed,
                &stripe_status,
                session.subscription_id.as_deref(),
            )
            .await?;
            if transaction.payment_status.can_transition_to(observed) {
                observed
            } else {
                transaction.payment_status
            }
        } else {
            if transaction.stripe_status.as_deref() != Some(stripe_status.as_str()) {
                self.transaction_repo
                    .update_stripe_status(transaction.id, &stripe_status)
                    .await?;
            }
            transaction.payment_status
        };

        Ok(CheckoutStatus {
            session_id: session.session_id,
            status: session.status,
            payment_status: session.payment_status,
            amount_total: session.amount_total,
            currency: session.currency,
            metadata: session.metadata,
            transaction_id: transaction.id,
            transaction_status,
            user_id: transaction.user_id,
        })
    }

    /// Verifies and dispatches a provider notification.
    #[instrument(skip(self, payload, signature))]
    pub async fn handle_webhook(
        &self,
        payload: &str,
        signature: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        let signature =
            signature.ok_or_else(|| AppError::InvalidInput("Missing Stripe signature".into()))?;
        let event = self.payment_gateway.verify_webhook(payload, signature)?;

        debug!(event_id = %event.id, event_type = %event.event_type, "Webhook received");

        match event.event_type.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                // Delayed payment methods complete the session before the money arrives.
                if event.object_str("payment_status") == Some("unpaid") {
                    debug!(event_id = %event.id, "Checkout completed but unpaid, waiting");
                    return Ok(WebhookOutcome::Ignored);
                }
                self.apply_session_event(&event, PaymentStatus::Paid).await
            }
            "checkout.session.async_payment_failed" => {
                self.apply_session_event(&event, PaymentStatus::Failed).await
            }
            "checkout.session.expired" => {
                self.apply_session_event(&event, PaymentStatus::Expired).await
            }
            other => {
                debug!(event_type = other, "Unhandled webhook event type");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn apply_session_event(
        &self,
        event: &WebhookEvent,
        status: PaymentStatus,
    ) -> AppResult<WebhookOutcome> {
        let Some(session_id) = event.object_id() else {
            warn!(event_id = %event.id, "Webhook session object without id");
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(transaction) = self.transaction_repo.get_by_session_id(session_id).await? else {
            warn!(event_id = %event.id, session_id, "Webhook for unknown checkout session");
            return Ok(WebhookOutcome::UnknownSession);
        };

        let stripe_status = format!(
            "{}/{}",
            event.object_str("status").unwrap_or("unknown"),
            event.object_str("payment_status").unwrap_or("unknown"),
        );
        self.apply_status(
            &transaction,
            status,
            &stripe_status,
            event.object_str("subscription"),
        )
        .await
    }

    /// Single place where a transaction leaves `pending`; activation is written
    /// together with the first successful move to `paid`.
    async fn apply_status(
        &self,
        transaction: &PaymentTransaction,
        status: PaymentStatus,
        stripe_status: &str,
        subscription_id: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        if !transaction.payment_status.can_transition_to(status) {
            debug!(
                transaction_id = %transaction.id,
                from = %transaction.payment_status,
                to = %status,
                "Transaction already settled"
            );
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let now = Utc::now();
        if status.is_successful() {
            return self
                .settle_and_activate(transaction, stripe_status, subscription_id, now)
                .await;
        }

        let moved = self
            .transaction_repo
            .transition_from_pending(transaction.id, status, Some(stripe_status), now)
            .await?;

        if !moved {
            debug!(transaction_id = %transaction.id, "Lost race to settle transaction");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        info!(
            transaction_id = %transaction.id,
            session_id = %transaction.session_id,
            status = %status,
            "Transaction settled"
        );
        Ok(WebhookOutcome::TransactionUpdated)
    }

    async fn settle_and_activate(
        &self,
        transaction: &PaymentTransaction,
        stripe_status: &str,
        subscription_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<WebhookOutcome> {
        let mut user = self
            .user_repo
            .get_by_id(transaction.user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        user.activate(now);
        if let Some(id) = subscription_id {
            user.stripe_subscription_id = Some(id.to_string());
        }

        let claimed = self
            .transaction_repo
            .settle_paid(transaction.id, stripe_status, now, &user)
            .await?;

        if !claimed {
            debug!(transaction_id = %transaction.id, "Lost race to settle transaction");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        info!(
            transaction_id = %transaction.id,
            session_id = %transaction.session_id,
            user_id = %user.id,
            subscription_end = ?user.subscription_end_date,
            "Payment settled, subscription activated"
        );
        Ok(WebhookOutcome::Activated)
    }
}
