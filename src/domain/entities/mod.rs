pub mod package;
pub mod payment_status;
pub mod payment_transaction;
pub mod premium_feature;
pub mod subscription_status;
pub mod user_subscription;
