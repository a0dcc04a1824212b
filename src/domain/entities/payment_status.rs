use serde::{Deserialize, Serialize};

/// Local status of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Expired,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    /// Map a Stripe Checkout session to a local status.
    ///
    /// `session_status` is the session's `status` (open/complete/expired) and
    /// `payment_status` its `payment_status` (paid/unpaid/no_payment_required).
    pub fn from_stripe_session(session_status: &str, payment_status: &str) -> Self {
        match (session_status, payment_status) {
            (_, "paid") | (_, "no_payment_required") => PaymentStatus::Paid,
            ("expired", _) => PaymentStatus::Expired,
            _ => PaymentStatus::Pending,
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    /// Only `pending` can still move; every other state is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Whether a stored transaction in `self` may be moved to `next`.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "expired" => Ok(PaymentStatus::Expired),
            "cancelled" | "canceled" => Ok(PaymentStatus::Cancelled),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}
