use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::UserSubscriptionRepo,
    domain::entities::{premium_feature::PremiumFeature, user_subscription::UserSubscription},
};

const SELECT_COLS: &str = r#"
    id, email, subscription_status, trial_start_date, trial_end_date,
    subscription_start_date, subscription_end_date, subscription_cancelled_date,
    subscription_cancel_reason, subscription_reactivated_date, last_payment_date,
    next_billing_date, stripe_subscription_id, cancel_at_period_end,
    recipes_generated, drinks_generated, carts_built, created_at, updated_at
"#;

/// Full overwrite of the subscription fields. Shared with checkout settlement,
/// which runs it inside its own transaction.
pub(super) async fn update_subscription<'e, E>(
    executor: E,
    user: &UserSubscription,
) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE users SET
            subscription_status = $2,
            trial_start_date = $3,
            trial_end_date = $4,
            subscription_start_date = $5,
            subscription_end_date = $6,
            subscription_cancelled_date = $7,
            subscription_cancel_reason = $8,
            subscription_reactivated_date = $9,
            last_payment_date = $10,
            next_billing_date = $11,
            stripe_subscription_id = $12,
            cancel_at_period_end = $13,
            recipes_generated = $14,
            drinks_generated = $15,
            carts_built = $16,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(user.subscription_status)
    .bind(user.trial_start_date)
    .bind(user.trial_end_date)
    .bind(user.subscription_start_date)
    .bind(user.subscription_end_date)
    .bind(user.subscription_cancelled_date)
    .bind(&user.subscription_cancel_reason)
    .bind(user.subscription_reactivated_date)
    .bind(user.last_payment_date)
    .bind(user.next_billing_date)
    .bind(&user.stripe_subscription_id)
    .bind(user.cancel_at_period_end)
    .bind(user.recipes_generated)
    .bind(user.drinks_generated)
    .bind(user.carts_built)
    .execute(executor)
    .await
    .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::user_not_found());
    }
    Ok(())
}

#[async_trait]
impl UserSubscriptionRepo for PostgresPersistence {
    async fn create(&self, user: &UserSubscription) -> AppResult<UserSubscription> {
        let row = sqlx::query_as::<_, UserSubscription>(&format!(
            r#"
            INSERT INTO users (
                id, email, subscription_status, trial_start_date, trial_end_date,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(user.subscription_status)
        .bind(user.trial_start_date)
        .bind(user.trial_end_date)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<UserSubscription>> {
        let row = sqlx::query_as::<_, UserSubscription>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserSubscription>> {
        let row = sqlx::query_as::<_, UserSubscription>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            SELECT_COLS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row)
    }

    async fn save(&self, user: &UserSubscription) -> AppResult<()> {
        update_subscription(&self.pool, user).await
    }

    async fn increment_usage(&self, id: Uuid, feature: PremiumFeature) -> AppResult<()> {
        // Column name comes from a closed enum, never from input.
        sqlx::query(&format!(
            "UPDATE users SET {col} = {col} + 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
            col = feature.counter_column()
        ))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                subscription_status = 'expired',
                next_billing_date = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE subscription_status = 'active'
              AND (subscription_end_date IS NULL OR subscription_end_date <= $1)
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }
}
