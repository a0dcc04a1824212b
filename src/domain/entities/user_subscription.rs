use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    billing_period::add_one_month, entities::subscription_status::SubscriptionStatus,
};

pub const DEFAULT_CANCEL_REASON: &str = "user_requested";

/// Subscription state embedded in a user. One per user, mutated in place.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSubscription {
    pub id: Uuid,
    pub email: String,
    pub subscription_status: SubscriptionStatus,
    pub trial_start_date: DateTime<Utc>,
    pub trial_end_date: DateTime<Utc>,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub subscription_cancelled_date: Option<DateTime<Utc>>,
    pub subscription_cancel_reason: Option<String>,
    pub subscription_reactivated_date: Option<DateTime<Utc>>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub stripe_subscription_id: Option<String>,
    pub cancel_at_period_end: bool,
    pub recipes_generated: i32,
    pub drinks_generated: i32,
    pub carts_built: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rejected lifecycle transitions. Messages are user-facing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("No active subscription to cancel")]
    NoActiveSubscription,

    #[error("User is still in trial period")]
    StillInTrial,

    #[error("Trial has ended, please subscribe through checkout")]
    TrialEnded,

    #[error("User already has active subscription")]
    AlreadyActive,
}

impl UserSubscription {
    /// Fresh record for a newly registered user.
    pub fn new_trial(id: Uuid, email: String, now: DateTime<Utc>, trial_length: Duration) -> Self {
        Self {
            id,
            email,
            subscription_status: SubscriptionStatus::Trial,
            trial_start_date: now,
            trial_end_date: now + trial_length,
            subscription_start_date: None,
            subscription_end_date: None,
            subscription_cancelled_date: None,
            subscription_cancel_reason: None,
            subscription_reactivated_date: None,
            last_payment_date: None,
            next_billing_date: None,
            stripe_subscription_id: None,
            cancel_at_period_end: false,
            recipes_generated: 0,
            drinks_generated: 0,
            carts_built: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn trial_active(&self, now: DateTime<Utc>) -> bool {
        now < self.trial_end_date
    }

    /// Stored `active` and inside the paid period.
    pub fn has_paid_period(&self, now: DateTime<Utc>) -> bool {
        self.subscription_status == SubscriptionStatus::Active
            && self.subscription_end_date.is_some_and(|end| now < end)
    }

    /// Stored status with lapsed paid periods reported as `expired`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        match self.subscription_status {
            SubscriptionStatus::Active if !self.has_paid_period(now) => SubscriptionStatus::Expired,
            status => status,
        }
    }

    /// Flip to `active` for one calendar month starting at `now`.
    pub fn activate(&mut self, now: DateTime<Utc>) {
        let end = add_one_month(now);
        self.subscription_status = SubscriptionStatus::Active;
        self.subscription_start_date = Some(now);
        self.subscription_end_date = Some(end);
        self.last_payment_date = Some(now);
        self.next_billing_date = Some(end);
        self.cancel_at_period_end = false;
        self.subscription_cancelled_date = None;
        self.subscription_cancel_reason = None;
        self.reset_usage();
        self.updated_at = now;
    }

    /// Access is cut immediately; `subscription_end_date` is left as it was.
    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<(), LifecycleError> {
        if self.effective_status(now) != SubscriptionStatus::Active {
            return Err(LifecycleError::NoActiveSubscription);
        }

        self.subscription_status = SubscriptionStatus::Cancelled;
        self.subscription_cancelled_date = Some(now);
        self.subscription_cancel_reason =
            Some(reason.unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string()));
        self.next_billing_date = None;
        self.updated_at = now;
        Ok(())
    }

    /// Restart a trial from `cancelled` or `expired`. No payment is taken.
    pub fn resubscribe(
        &mut self,
        now: DateTime<Utc>,
        trial_length: Duration,
    ) -> Result<(), LifecycleError> {
        match self.effective_status(now) {
            SubscriptionStatus::Active => return Err(LifecycleError::AlreadyActive),
            SubscriptionStatus::Trial if self.trial_active(now) => {
                return Err(LifecycleError::StillInTrial);
            }
            SubscriptionStatus::Trial => return Err(LifecycleError::TrialEnded),
            SubscriptionStatus::Cancelled | SubscriptionStatus::Expired => {}
        }

        self.subscription_status = SubscriptionStatus::Trial;
        self.trial_start_date = now;
        self.trial_end_date = now + trial_length;
        self.subscription_cancelled_date = None;
        self.subscription_cancel_reason = None;
        self.cancel_at_period_end = false;
        self.subscription_reactivated_date = Some(now);
        self.reset_usage();
        self.updated_at = now;
        Ok(())
    }

    /// Persist the time-based `active -> expired` step. Returns true if it happened.
    pub fn expire_if_lapsed(&mut self, now: DateTime<Utc>) -> bool {
        if self.subscription_status == SubscriptionStatus::Active && !self.has_paid_period(now) {
            self.subscription_status = SubscriptionStatus::Expired;
            self.next_billing_date = None;
            self.updated_at = now;
            return true;
        }
        false
    }

    pub fn reset_usage(&mut self) {
        self.recipes_generated = 0;
        self.drinks_generated = 0;
        self.carts_built = 0;
    }
}
