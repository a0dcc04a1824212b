use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{ports::payment_gateway::PaymentGatewayPort, validators::is_valid_email},
    domain::{
        entitlement::{self, AccessStatus},
        entities::{premium_feature::PremiumFeature, user_subscription::UserSubscription},
    },
};

#[async_trait]
pub trait UserSubscriptionRepo: Send + Sync {
    async fn create(&self, user: &UserSubscription) -> AppResult<UserSubscription>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<UserSubscription>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserSubscription>>;
    /// Overwrite the subscription fields of an existing record.
    async fn save(&self, user: &UserSubscription) -> AppResult<()>;
    async fn increment_usage(&self, id: Uuid, feature: PremiumFeature) -> AppResult<()>;
    /// Mark every stored `active` record whose period ended before `now` as `expired`.
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Register, status, cancel and resubscribe.
#[derive(Clone)]
pub struct SubscriptionUseCases {
    user_repo: Arc<dyn UserSubscriptionRepo>,
    payment_gateway: Arc<dyn PaymentGatewayPort>,
    trial_length: Duration,
}

impl SubscriptionUseCases {
    pub fn new(
        user_repo: Arc<dyn UserSubscriptionRepo>,
        payment_gateway: Arc<dyn PaymentGatewayPort>,
        trial_length: Duration,
    ) -> Self {
        Self {
            user_repo,
            payment_gateway,
            trial_length,
        }
    }

    #[instrument(skip(self))]
    pub async fn register(&self, email: &str) -> AppResult<UserSubscription> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let user =
            UserSubscription::new_trial(Uuid::new_v4(), email, Utc::now(), self.trial_length);
        let created = self.user_repo.create(&user).await?;

        info!(user_id = %created.id, trial_end = %created.trial_end_date, "Trial started");
        Ok(created)
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<UserSubscription> {
        self.user_repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)
    }

    /// Current entitlement. A lapsed paid period is persisted as `expired` on the way.
    #[instrument(skip(self))]
    pub async fn access_status(&self, user_id: Uuid) -> AppResult<AccessStatus> {
        let mut user = self.get_user(user_id).await?;
        let now = Utc::now();

        if user.expire_if_lapsed(now) {
            self.user_repo.save(&user).await?;
            info!(%user_id, "Subscription period lapsed, marked expired");
        }

        Ok(entitlement::evaluate(&user, now))
    }

    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        user_id: Uuid,
        reason: Option<String>,
    ) -> AppResult<UserSubscription> {
        let mut user = self.get_user(user_id).await?;
        let now = Utc::now();

        user.cancel(now, reason)?;

        if let Some(external_id) = user.stripe_subscription_id.as_deref() {
            self.payment_gateway
                .cancel_subscription(external_id)
                .await
                .map_err(|e| {
                    warn!(%user_id, error = %e, "Provider cancellation failed");
                    AppError::upstream("Failed to cancel subscription", e)
                })?;
        }

        self.user_repo.save(&user).await?;

        info!(
            %user_id,
            reason = user.subscription_cancel_reason.as_deref().unwrap_or_default(),
            "Subscription cancelled"
        );
        Ok(user)
    }

    /// Restarts a trial for a cancelled or expired user. No charge is made.
    #[instrument(skip(self))]
    pub async fn resubscribe(&self, user_id: Uuid) -> AppResult<UserSubscription> {
        let mut user = self.get_user(user_id).await?;
        let now = Utc::now();

        user.resubscribe(now, self.trial_length)?;
        self.user_repo.save(&user).await?;

        info!(%user_id, trial_end = %user.trial_end_date, "Resubscribed, new trial started");
        Ok(user)
    }

    pub async fn expire_lapsed(&self) -> AppResult<u64> {
        self.user_repo.expire_lapsed(Utc::now()).await
    }
}
