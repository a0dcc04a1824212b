use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::payment_status::PaymentStatus;

/// One checkout attempt. Created `pending` before the checkout URL is handed out.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub package_id: String,
    pub payment_status: PaymentStatus,
    /// Raw status last reported by Stripe.
    pub stripe_status: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentTransaction {
    pub user_id: Uuid,
    pub session_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub package_id: String,
    pub metadata: serde_json::Value,
}
