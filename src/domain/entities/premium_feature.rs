use serde::Serialize;

/// Features that cost money to serve and sit behind the entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumFeature {
    Recipe,
    StarbucksDrink,
    GroceryCart,
}

impl PremiumFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            PremiumFeature::Recipe => "recipe",
            PremiumFeature::StarbucksDrink => "starbucks_drink",
            PremiumFeature::GroceryCart => "grocery_cart",
        }
    }

    /// Usage counter column on `users`.
    pub fn counter_column(&self) -> &'static str {
        match self {
            PremiumFeature::Recipe => "recipes_generated",
            PremiumFeature::StarbucksDrink => "drinks_generated",
            PremiumFeature::GroceryCart => "carts_built",
        }
    }
}

impl std::fmt::Display for PremiumFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
