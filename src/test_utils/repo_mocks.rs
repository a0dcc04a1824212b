//! In-memory mock implementations of the repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{checkout::PaymentTransactionRepo, subscription::UserSubscriptionRepo},
    domain::entities::{
        payment_status::PaymentStatus,
        payment_transaction::{NewPaymentTransaction, PaymentTransaction},
        premium_feature::PremiumFeature,
        user_subscription::UserSubscription,
    },
};

// ============================================================================
// InMemoryUserSubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserSubscriptionRepo {
    pub users: Mutex<HashMap<Uuid, UserSubscription>>,
    saves: AtomicUsize,
    fail_next_save: AtomicBool,
}

impl InMemoryUserSubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserSubscription>) -> Self {
        let map: HashMap<Uuid, UserSubscription> = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn get(&self, id: Uuid) -> Option<UserSubscription> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    /// The next `save` fails with a database error and stores nothing.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserSubscriptionRepo for InMemoryUserSubscriptionRepo {
    async fn create(&self, user: &UserSubscription) -> AppResult<UserSubscription> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "A record with this value already exists".into(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<UserSubscription>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserSubscription>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save(&self, user: &UserSubscription) -> AppResult<()> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database("Database operation failed".into()));
        }
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                self.saves.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(AppError::user_not_found()),
        }
    }

    async fn increment_usage(&self, id: Uuid, feature: PremiumFeature) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or_else(AppError::user_not_found)?;
        match feature {
            PremiumFeature::Recipe => user.recipes_generated += 1,
            PremiumFeature::StarbucksDrink => user.drinks_generated += 1,
            PremiumFeature::GroceryCart => user.carts_built += 1,
        }
        Ok(())
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut users = self.users.lock().unwrap();
        let expired = users
            .values_mut()
            .map(|u| u.expire_if_lapsed(now))
            .filter(|changed| *changed)
            .count();
        Ok(expired as u64)
    }
}

// ============================================================================
// InMemoryPaymentTransactionRepo
// ============================================================================

/// Shares the user repo so `settle_paid` can write both sides like the
/// Postgres transaction does.
pub struct InMemoryPaymentTransactionRepo {
    pub transactions: Mutex<HashMap<Uuid, PaymentTransaction>>,
    users: Arc<InMemoryUserSubscriptionRepo>,
}

impl InMemoryPaymentTransactionRepo {
    pub fn with_transactions(
        users: Arc<InMemoryUserSubscriptionRepo>,
        transactions: Vec<PaymentTransaction>,
    ) -> Self {
        let map: HashMap<Uuid, PaymentTransaction> =
            transactions.into_iter().map(|t| (t.id, t)).collect();
        Self {
            transactions: Mutex::new(map),
            users,
        }
    }

    fn is_pending(&self, id: Uuid) -> bool {
        self.transactions
            .lock()
            .unwrap()
            .get(&id)
            .is_some_and(|t| t.payment_status == PaymentStatus::Pending && t.completed_at.is_none())
    }

    pub fn get_by_session(&self, session_id: &str) -> Option<PaymentTransaction> {
        self.transactions
            .lock()
            .unwrap()
            .values()
            .find(|t| t.session_id == session_id)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentTransactionRepo for InMemoryPaymentTransactionRepo {
    async fn create(&self, input: &NewPaymentTransaction) -> AppResult<PaymentTransaction> {
        let mut transactions = self.transactions.lock().unwrap();
        if transactions.values().any(|t| t.session_id == input.session_id) {
            return Err(AppError::Conflict(
                "A record with this value already exists".into(),
            ));
        }

        let now = Utc::now();
        let transaction = PaymentTransaction {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            session_id: input.session_id.clone(),
            amount_cents: input.amount_cents,
            currency: input.currency.clone(),
            package_id: input.package_id.clone(),
            payment_status: PaymentStatus::Pending,
            stripe_status: None,
            metadata: input.metadata.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn get_by_session_id(&self, session_id: &str) -> AppResult<Option<PaymentTransaction>> {
        Ok(self.get_by_session(session_id))
    }

    async fn transition_from_pending(
        &self,
        id: Uuid,
        to: PaymentStatus,
        stripe_status: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut transactions = self.transactions.lock().unwrap();
        let Some(tx) = transactions.get_mut(&id) else {
            return Ok(false);
        };
        if tx.payment_status != PaymentStatus::Pending || tx.completed_at.is_some() {
            return Ok(false);
        }

        tx.payment_status = to;
        if let Some(status) = stripe_status {
            tx.stripe_status = Some(status.to_string());
        }
        tx.updated_at = at;
        Ok(true)
    }

    async fn settle_paid(
        &self,
        id: Uuid,
        stripe_status: &str,
        at: DateTime<Utc>,
        activated: &UserSubscription,
    ) -> AppResult<bool> {
        if !self.is_pending(id) {
            return Ok(false);
        }

        // User first: a failed save must leave the transaction untouched.
        self.users.save(activated).await?;

        let mut transactions = self.transactions.lock().unwrap();
        let Some(tx) = transactions.get_mut(&id) else {
            return Ok(false);
        };
        tx.payment_status = PaymentStatus::Paid;
        tx.stripe_status = Some(stripe_status.to_string());
        tx.completed_at = Some(at);
        tx.updated_at = at;
        Ok(true)
    }

    async fn update_stripe_status(&self, id: Uuid, stripe_status: &str) -> AppResult<()> {
        if let Some(tx) = self.transactions.lock().unwrap().get_mut(&id) {
            tx.stripe_status = Some(stripe_status.to_string());
            tx.updated_at = Utc::now();
        }
        Ok(())
    }
}
