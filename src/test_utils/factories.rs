//! Test data factories.
//!
//! Each factory returns a complete, valid object. Use the closure to override fields.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    package::MONTHLY_PREMIUM,
    payment_status::PaymentStatus,
    payment_transaction::PaymentTransaction,
    user_subscription::UserSubscription,
};

/// A user whose 49-day trial started just now.
pub fn create_test_user(overrides: impl FnOnce(&mut UserSubscription)) -> UserSubscription {
    let id = Uuid::new_v4();
    let mut user = UserSubscription::new_trial(
        id,
        format!("user-{}@example.com", id.simple()),
        Utc::now(),
        Duration::days(49),
    );
    overrides(&mut user);
    user
}

/// A pending checkout for the monthly package.
pub fn create_test_transaction(
    user_id: Uuid,
    overrides: impl FnOnce(&mut PaymentTransaction),
) -> PaymentTransaction {
    let now = Utc::now();
    let mut transaction = PaymentTransaction {
        id: Uuid::new_v4(),
        user_id,
        session_id: format!("cs_test_{}", Uuid::new_v4().simple()),
        amount_cents: MONTHLY_PREMIUM.amount_cents,
        currency: MONTHLY_PREMIUM.currency.to_string(),
        package_id: MONTHLY_PREMIUM.id.to_string(),
        payment_status: PaymentStatus::Pending,
        stripe_status: None,
        metadata: serde_json::json!({ "user_id": user_id.to_string() }),
        created_at: now,
        updated_at: now,
        completed_at: None,
    };
    overrides(&mut transaction);
    transaction
}
