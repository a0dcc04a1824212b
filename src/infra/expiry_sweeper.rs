use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::use_cases::subscription::SubscriptionUseCases;

/// Marks lapsed paid periods as `expired` so stored status stays close to reality
/// for users who never call the status endpoint.
pub async fn run_expiry_sweep_loop(
    subscription_use_cases: Arc<SubscriptionUseCases>,
    every_secs: u64,
) {
    let mut ticker = interval(Duration::from_secs(every_secs.max(1)));

    info!("Subscription expiry sweep started (every {}s)", every_secs);

    loop {
        ticker.tick().await;

        match subscription_use_cases.expire_lapsed().await {
            Ok(0) => {}
            Ok(count) => info!(count, "Expired lapsed subscriptions"),
            Err(e) => error!(error = %e, "Expiry sweep failed"),
        }
    }
}
