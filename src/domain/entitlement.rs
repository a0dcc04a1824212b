//! Entitlement evaluation: whether a user may use premium features right now.
//!
//! Everything here is pure. Callers pass the clock in so that gates, status
//! responses and tests agree on a single `now`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{
    subscription_status::SubscriptionStatus, user_subscription::UserSubscription,
};

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_WEEK: i64 = 7 * SECS_PER_DAY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessStatus {
    pub has_access: bool,
    pub subscription_status: SubscriptionStatus,
    pub trial_active: bool,
    pub subscription_active: bool,
    pub trial_days_left: i64,
    pub current_week: i64,
    pub trial_end_date: DateTime<Utc>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

/// `trial_active || subscription_active`.
pub fn has_access(record: &UserSubscription, now: DateTime<Utc>) -> bool {
    trial_active(record, now) || subscription_active(record, now)
}

pub fn evaluate(record: &UserSubscription, now: DateTime<Utc>) -> AccessStatus {
    let trial_active = trial_active(record, now);
    let subscription_active = subscription_active(record, now);

    AccessStatus {
        has_access: trial_active || subscription_active,
        subscription_status: record.effective_status(now),
        trial_active,
        subscription_active,
        trial_days_left: trial_days_left(record.trial_end_date, now),
        current_week: current_week(record.trial_start_date, now),
        trial_end_date: record.trial_end_date,
        subscription_end_date: record.subscription_end_date,
        next_billing_date: record.next_billing_date,
        cancel_at_period_end: record.cancel_at_period_end,
    }
}

fn trial_active(record: &UserSubscription, now: DateTime<Utc>) -> bool {
    now < record.trial_end_date
}

fn subscription_active(record: &UserSubscription, now: DateTime<Utc>) -> bool {
    record.subscription_status == SubscriptionStatus::Active
        && record.subscription_end_date.is_some_and(|end| now < end)
}

/// Whole days left, rounded up. A trial ending in one hour still has one day left.
fn trial_days_left(trial_end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (trial_end - now).num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
    }
}

/// 1-based week since the trial started.
fn current_week(trial_start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (now - trial_start).num_seconds();
    if secs < 0 { 1 } else { secs / SECS_PER_WEEK + 1 }
}
