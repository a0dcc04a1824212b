use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        helpers::ingredient_matching::{best_match, search_term},
        ports::premium::{
            Drink, DrinkPrompt, Product, ProductSearch, Recipe, RecipeGenerator, RecipePrompt,
        },
        use_cases::subscription::UserSubscriptionRepo,
    },
    domain::{
        entitlement::{self, AccessStatus},
        entities::{premium_feature::PremiumFeature, user_subscription::UserSubscription},
    },
};

const SEARCH_RESULTS_PER_INGREDIENT: u8 = 5;
const MAX_CART_INGREDIENTS: usize = 40;

/// Fails with `PaymentRequired` carrying the evaluated status when access is denied.
pub fn require_access(record: &UserSubscription, now: DateTime<Utc>) -> AppResult<AccessStatus> {
    let status = entitlement::evaluate(record, now);
    if status.has_access {
        Ok(status)
    } else {
        Err(AppError::PaymentRequired(Box::new(status)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub ingredient: String,
    pub search_term: String,
    /// `None` when the catalog had nothing resembling the ingredient.
    pub product: Option<Product>,
    pub alternatives: Vec<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartOptions {
    pub items: Vec<CartLine>,
    pub estimated_total: f64,
    pub unmatched: usize,
}

/// Paid-for features. Every operation checks entitlement before doing any work.
#[derive(Clone)]
pub struct PremiumUseCases {
    user_repo: Arc<dyn UserSubscriptionRepo>,
    generator: Arc<dyn RecipeGenerator>,
    product_search: Arc<dyn ProductSearch>,
}

impl PremiumUseCases {
    pub fn new(
        user_repo: Arc<dyn UserSubscriptionRepo>,
        generator: Arc<dyn RecipeGenerator>,
        product_search: Arc<dyn ProductSearch>,
    ) -> Self {
        Self {
            user_repo,
            generator,
            product_search,
        }
    }

    async fn authorize(&self, user_id: Uuid, feature: PremiumFeature) -> AppResult<()> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        if let Err(e) = require_access(&user, Utc::now()) {
            info!(%user_id, %feature, "Premium feature denied");
            return Err(e);
        }
        Ok(())
    }

    async fn record_usage(&self, user_id: Uuid, feature: PremiumFeature) {
        // The user already got the result; a lost counter bump is not worth a 500.
        if let Err(e) = self.user_repo.increment_usage(user_id, feature).await {
            warn!(%user_id, %feature, error = %e, "Failed to record usage");
        }
    }

    #[instrument(skip(self, prompt))]
    pub async fn generate_recipe(&self, user_id: Uuid, prompt: &RecipePrompt) -> AppResult<Recipe> {
        self.authorize(user_id, PremiumFeature::Recipe).await?;

        let recipe = self.generator.generate_recipe(prompt).await.map_err(|e| {
            warn!(%user_id, error = %e, "Recipe generation failed");
            AppError::upstream("Failed to generate recipe", e)
        })?;

        self.record_usage(user_id, PremiumFeature::Recipe).await;
        Ok(recipe)
    }

    #[instrument(skip(self, prompt))]
    pub async fn generate_drink(&self, user_id: Uuid, prompt: &DrinkPrompt) -> AppResult<Drink> {
        self.authorize(user_id, PremiumFeature::StarbucksDrink).await?;

        let drink = self.generator.generate_drink(prompt).await.map_err(|e| {
            warn!(%user_id, error = %e, "Drink generation failed");
            AppError::upstream("Failed to generate drink", e)
        })?;

        self.record_usage(user_id, PremiumFeature::StarbucksDrink).await;
        Ok(drink)
    }

    #[instrument(skip(self, ingredients), fields(count = ingredients.len()))]
    pub async fn cart_options(
        &self,
        user_id: Uuid,
        ingredients: &[String],
    ) -> AppResult<CartOptions> {
        self.authorize(user_id, PremiumFeature::GroceryCart).await?;

        let ingredients: Vec<&str> = ingredients
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if ingredients.is_empty() {
            return Err(AppError::InvalidInput("At least one ingredient is required".into()));
        }
        if ingredients.len() > MAX_CART_INGREDIENTS {
            return Err(AppError::InvalidInput(format!(
                "At most {} ingredients per cart",
                MAX_CART_INGREDIENTS
            )));
        }

        let mut items = Vec::with_capacity(ingredients.len());
        for ingredient in ingredients {
            let term = search_term(ingredient);
            let products = self
                .product_search
                .search(&term, SEARCH_RESULTS_PER_INGREDIENT)
                .await
                .map_err(|e| {
                    warn!(%user_id, term, error = %e, "Product search failed");
                    AppError::upstream("Failed to search products", e)
                })?;

            let product = best_match(ingredient, &products).cloned();
            let alternatives = products
                .into_iter()
                .filter(|p| product.as_ref().is_none_or(|chosen| chosen.id != p.id))
                .collect();

            items.push(CartLine {
                ingredient: ingredient.to_string(),
                search_term: term,
                product,
                alternatives,
            });
        }

        let estimated_total = items
            .iter()
            .filter_map(|line| line.product.as_ref())
            .map(|p| p.price)
            .sum::<f64>();
        let unmatched = items.iter().filter(|line| line.product.is_none()).count();

        self.record_usage(user_id, PremiumFeature::GroceryCart).await;

        Ok(CartOptions {
            items,
            estimated_total: (estimated_total * 100.0).round() / 100.0,
            unmatched,
        })
    }
}
