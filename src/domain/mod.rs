pub mod billing_period;
pub mod entitlement;
pub mod entities;
