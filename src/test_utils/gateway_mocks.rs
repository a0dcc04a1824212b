//! Scripted fakes for the payment gateway and the premium feature backends.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        payment_gateway::{
            CheckoutRequest, CheckoutSession, CheckoutSessionInfo, PaymentGatewayPort, WebhookEvent,
        },
        premium::{
            Drink, DrinkPrompt, Product, ProductSearch, Recipe, RecipeGenerator, RecipePrompt,
        },
    },
    infra::{stripe_client::StripeClient, stripe_payment_adapter::parse_webhook_event},
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_fixture";

/// `stripe-signature` header for `payload`, signed now with the test secret.
pub fn signed_webhook(payload: &str) -> String {
    StripeClient::sign_webhook_payload(payload, TEST_WEBHOOK_SECRET, Utc::now().timestamp())
}

// ============================================================================
// FakePaymentGateway
// ============================================================================

/// Records calls and serves scripted session states.
/// Webhooks go through the real signature check with `TEST_WEBHOOK_SECRET`.
#[derive(Default)]
pub struct FakePaymentGateway {
    next_session: AtomicUsize,
    fail_next: AtomicBool,
    requests: Mutex<Vec<CheckoutRequest>>,
    sessions: Mutex<HashMap<String, (String, String)>>,
    cancelled: Mutex<Vec<String>>,
    subscriptions: Mutex<HashMap<String, String>>,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next gateway call returns an upstream error.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn set_session_state(&self, session_id: &str, status: &str, payment_status: &str) {
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            (status.to_string(), payment_status.to_string()),
        );
    }

    /// Reports `subscription_id` as created by `session_id`.
    pub fn set_session_subscription(&self, session_id: &str, subscription_id: &str) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), subscription_id.to_string());
    }

    pub fn last_checkout_request(&self) -> Option<CheckoutRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn cancelled_subscriptions(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    fn check_failure(&self) -> AppResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::upstream("Stripe API error", "500 - scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGatewayPort for FakePaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutSession> {
        self.check_failure()?;
        let n = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = format!("cs_test_fake_{}", n);
        self.requests.lock().unwrap().push(request.clone());
        self.set_session_state(&session_id, "open", "unpaid");
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{}", session_id),
            session_id,
        })
    }

    async fn get_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSessionInfo> {
        self.check_failure()?;
        let (status, payment_status) = self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| ("open".to_string(), "unpaid".to_string()));

        Ok(CheckoutSessionInfo {
            session_id: session_id.to_string(),
            status,
            payment_status,
            amount_total: Some(999),
            currency: Some("usd".to_string()),
            metadata: HashMap::new(),
            subscription_id: self.subscriptions.lock().unwrap().get(session_id).cloned(),
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> AppResult<()> {
        self.check_failure()?;
        self.cancelled
            .lock()
            .unwrap()
            .push(subscription_id.to_string());
        Ok(())
    }

    fn verify_webhook(&self, payload: &str, signature_header: &str) -> AppResult<WebhookEvent> {
        StripeClient::verify_webhook_signature(
            payload,
            signature_header,
            TEST_WEBHOOK_SECRET,
            Utc::now().timestamp(),
        )?;
        parse_webhook_event(payload)
    }
}

// ============================================================================
// FakeRecipeGenerator
// ============================================================================

#[derive(Default)]
pub struct FakeRecipeGenerator {
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl FakeRecipeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn record_call(&self) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::upstream("OpenAI API error", "429 Too Many Requests"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeGenerator for FakeRecipeGenerator {
    async fn generate_recipe(&self, prompt: &RecipePrompt) -> AppResult<Recipe> {
        self.record_call()?;
        Ok(Recipe {
            name: "Weeknight Chickpea Curry".to_string(),
            description: "Pantry curry in 30 minutes".to_string(),
            ingredients: vec![
                "1 can chickpeas".to_string(),
                "1 can coconut milk".to_string(),
                "2 tbsp curry paste".to_string(),
            ],
            instructions: vec!["Simmer everything for 20 minutes.".to_string()],
            servings: prompt.servings.or(Some(2)),
        })
    }

    async fn generate_drink(&self, _prompt: &DrinkPrompt) -> AppResult<Drink> {
        self.record_call()?;
        Ok(Drink {
            name: "Cinnamon Cloud".to_string(),
            description: "Light and cozy".to_string(),
            base_drink: "Iced Caramel Macchiato".to_string(),
            modifications: vec!["Add cinnamon dolce syrup".to_string()],
            ordering_script: "Grande iced caramel macchiato with one pump cinnamon dolce, please."
                .to_string(),
        })
    }
}

// ============================================================================
// FakeProductSearch
// ============================================================================

/// Returns the products registered for an exact query string.
#[derive(Default)]
pub struct FakeProductSearch {
    catalog: Mutex<HashMap<String, Vec<Product>>>,
    queries: Mutex<Vec<String>>,
}

impl FakeProductSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, query: &str, name: &str, price: f64) {
        let mut catalog = self.catalog.lock().unwrap();
        let entry = catalog.entry(query.to_string()).or_default();
        entry.push(Product {
            id: format!("{}-{}", query, entry.len() + 1),
            name: name.to_string(),
            price,
            image_url: None,
        });
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductSearch for FakeProductSearch {
    async fn search(&self, query: &str, limit: u8) -> AppResult<Vec<Product>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .catalog
            .lock()
            .unwrap()
            .get(query)
            .map(|products| products.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }
}
