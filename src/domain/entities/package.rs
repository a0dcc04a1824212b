use serde::Serialize;

pub const MONTHLY_PREMIUM_ID: &str = "monthly_premium";

/// Server-defined price point. Amounts never come from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Package {
    #[serde(skip)]
    pub id: &'static str,
    #[serde(rename = "amount", serialize_with = "serialize_decimal")]
    pub amount_cents: i64,
    pub currency: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const MONTHLY_PREMIUM: Package = Package {
    id: MONTHLY_PREMIUM_ID,
    amount_cents: 999,
    currency: "usd",
    name: "Premium Monthly",
    description: "Unlimited AI recipes, Starbucks drinks and grocery carts",
};

pub fn catalog() -> &'static [Package] {
    &[MONTHLY_PREMIUM]
}

pub fn find(id: &str) -> Option<Package> {
    catalog().iter().copied().find(|p| p.id == id)
}

impl Package {
    /// Major units, e.g. 9.99.
    pub fn amount_decimal(&self) -> f64 {
        cents_to_decimal(self.amount_cents)
    }
}

pub fn cents_to_decimal(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn serialize_decimal<S: serde::Serializer>(cents: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(cents_to_decimal(*cents))
}
