use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        checkout::CheckoutUseCases, premium::PremiumUseCases, subscription::SubscriptionUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub checkout_use_cases: Arc<CheckoutUseCases>,
    pub premium_use_cases: Arc<PremiumUseCases>,
}
