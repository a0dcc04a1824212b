use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Lifecycle state of a user's subscription.
///
/// `Expired` is never set by a handler directly: a stored `Active` record whose
/// paid period has lapsed is reported (and eventually persisted) as `Expired`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    #[default]
    Trial,
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}
