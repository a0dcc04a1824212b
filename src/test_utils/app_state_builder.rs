//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires the real use cases to in-memory repos and scripted fakes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::Duration;
use secrecy::SecretString;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        checkout::CheckoutUseCases, premium::PremiumUseCases, subscription::SubscriptionUseCases,
    },
    domain::entities::{
        payment_transaction::PaymentTransaction, user_subscription::UserSubscription,
    },
    infra::config::{AppConfig, DEFAULT_TRIAL_DAYS},
    test_utils::{
        FakePaymentGateway, FakeProductSearch, FakeRecipeGenerator, InMemoryPaymentTransactionRepo,
        InMemoryUserSubscriptionRepo, TEST_WEBHOOK_SECRET,
    },
};

pub fn test_config() -> AppConfig {
    AppConfig {
        stripe_api_key: SecretString::from("sk_test_fixture".to_string()),
        stripe_webhook_secret: SecretString::from(TEST_WEBHOOK_SECRET.to_string()),
        openai_api_key: SecretString::from("sk-openai-fixture".to_string()),
        openai_model: "gpt-4o-mini".to_string(),
        walmart_api_key: SecretString::from("walmart-fixture".to_string()),
        walmart_api_base: "http://localhost:9/walmart".to_string(),
        database_url: "postgres://localhost/test".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        trial_days: DEFAULT_TRIAL_DAYS,
        expiry_sweep_secs: 3600,
    }
}

/// Handles to the fakes behind a built `AppState`.
pub struct TestMocks {
    pub users: Arc<InMemoryUserSubscriptionRepo>,
    pub transactions: Arc<InMemoryPaymentTransactionRepo>,
    pub gateway: Arc<FakePaymentGateway>,
    pub generator: Arc<FakeRecipeGenerator>,
    pub search: Arc<FakeProductSearch>,
}

/// Builder for creating `AppState` with in-memory mocks.
///
/// # Example
///
/// ```ignore
/// let user = create_test_user(|u| u.email = "cook@example.com".into());
/// let (app_state, mocks) = TestAppStateBuilder::new().with_user(user).build_with_mocks();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    users: Vec<UserSubscription>,
    transactions: Vec<PaymentTransaction>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserSubscription) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_transaction(mut self, transaction: PaymentTransaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let config = test_config();
        let users = Arc::new(InMemoryUserSubscriptionRepo::with_users(self.users));
        let mocks = TestMocks {
            transactions: Arc::new(InMemoryPaymentTransactionRepo::with_transactions(
                users.clone(),
                self.transactions,
            )),
            users,
            gateway: Arc::new(FakePaymentGateway::new()),
            generator: Arc::new(FakeRecipeGenerator::new()),
            search: Arc::new(FakeProductSearch::new()),
        };

        let subscription_use_cases = SubscriptionUseCases::new(
            mocks.users.clone(),
            mocks.gateway.clone(),
            Duration::days(config.trial_days),
        );
        let checkout_use_cases = CheckoutUseCases::new(
            mocks.users.clone(),
            mocks.transactions.clone(),
            mocks.gateway.clone(),
        );
        let premium_use_cases = PremiumUseCases::new(
            mocks.users.clone(),
            mocks.generator.clone(),
            mocks.search.clone(),
        );

        let app_state = AppState {
            config: Arc::new(config),
            subscription_use_cases: Arc::new(subscription_use_cases),
            checkout_use_cases: Arc::new(checkout_use_cases),
            premium_use_cases: Arc::new(premium_use_cases),
        };

        (app_state, mocks)
    }
}
