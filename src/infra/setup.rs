use crate::{
    adapters::http::app_state::AppState,
    application::{
        ports::{
            payment_gateway::PaymentGatewayPort,
            premium::{ProductSearch, RecipeGenerator},
        },
        use_cases::{
            checkout::{CheckoutUseCases, PaymentTransactionRepo},
            premium::PremiumUseCases,
            subscription::{SubscriptionUseCases, UserSubscriptionRepo},
        },
    },
    infra::{
        config::AppConfig,
        http_client::{DEFAULT_REQUEST_TIMEOUT, GENERATION_REQUEST_TIMEOUT, build_client},
        openai_client::OpenAiClient,
        postgres_persistence,
        stripe_client::StripeClient,
        stripe_payment_adapter::StripePaymentAdapter,
        walmart_client::WalmartClient,
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    let user_repo_arc = postgres_arc.clone() as Arc<dyn UserSubscriptionRepo>;
    let transaction_repo_arc = postgres_arc.clone() as Arc<dyn PaymentTransactionRepo>;

    let http = build_client(DEFAULT_REQUEST_TIMEOUT)?;
    let stripe = StripeClient::new(http.clone(), config.stripe_api_key.clone());
    let payment_gateway = Arc::new(StripePaymentAdapter::new(
        stripe,
        config.stripe_webhook_secret.clone(),
    )) as Arc<dyn PaymentGatewayPort>;

    let generator = Arc::new(OpenAiClient::new(
        build_client(GENERATION_REQUEST_TIMEOUT)?,
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    )) as Arc<dyn RecipeGenerator>;
    let product_search = Arc::new(WalmartClient::new(
        http,
        config.walmart_api_key.clone(),
        config.walmart_api_base.clone(),
    )) as Arc<dyn ProductSearch>;

    let subscription_use_cases = SubscriptionUseCases::new(
        user_repo_arc.clone(),
        payment_gateway.clone(),
        config.trial_length(),
    );
    let checkout_use_cases =
        CheckoutUseCases::new(user_repo_arc.clone(), transaction_repo_arc, payment_gateway);
    let premium_use_cases = PremiumUseCases::new(user_repo_arc, generator, product_search);

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases: Arc::new(subscription_use_cases),
        checkout_use_cases: Arc::new(checkout_use_cases),
        premium_use_cases: Arc::new(premium_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "smartcart_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs). Console-only if the file can't be created.
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
