use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, user_subscription::update_subscription},
    app_error::{AppError, AppResult},
    application::use_cases::checkout::PaymentTransactionRepo,
    domain::entities::{
        payment_status::PaymentStatus,
        payment_transaction::{NewPaymentTransaction, PaymentTransaction},
        user_subscription::UserSubscription,
    },
};

fn row_to_transaction(row: &sqlx::postgres::PgRow) -> PaymentTransaction {
    PaymentTransaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        session_id: row.get("session_id"),
        amount_cents: row.get("amount_cents"),
        currency: row.get("currency"),
        package_id: row.get("package_id"),
        payment_status: row.get("payment_status"),
        stripe_status: row.get("stripe_status"),
        metadata: row.get("metadata"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        completed_at: row.get("completed_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, session_id, amount_cents, currency, package_id, payment_status,
    stripe_status, metadata, created_at, updated_at, completed_at
"#;

#[async_trait]
impl PaymentTransactionRepo for PostgresPersistence {
    async fn create(&self, input: &NewPaymentTransaction) -> AppResult<PaymentTransaction> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payment_transactions (
                id, user_id, session_id, amount_cents, currency, package_id,
                payment_status, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(input.user_id)
        .bind(&input.session_id)
        .bind(input.amount_cents)
        .bind(&input.currency)
        .bind(&input.package_id)
        .bind(&input.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_transaction(&row))
    }

    async fn get_by_session_id(&self, session_id: &str) -> AppResult<Option<PaymentTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payment_transactions WHERE session_id = $1",
            SELECT_COLS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_transaction))
    }

    async fn transition_from_pending(
        &self,
        id: Uuid,
        to: PaymentStatus,
        stripe_status: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions SET
                payment_status = $2,
                stripe_status = COALESCE($3, stripe_status),
                updated_at = $4
            WHERE id = $1
              AND payment_status = 'pending'
              AND completed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(to)
        .bind(stripe_status)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn settle_paid(
        &self,
        id: Uuid,
        stripe_status: &str,
        at: DateTime<Utc>,
        activated: &UserSubscription,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE payment_transactions SET
                payment_status = 'paid',
                stripe_status = $2,
                completed_at = $3,
                updated_at = $3
            WHERE id = $1
              AND payment_status = 'pending'
              AND completed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(stripe_status)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        // Dropping `tx` rolls back, so an early return or a failed user write
        // keeps the transaction pending.
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        update_subscription(&mut *tx, activated).await?;
        tx.commit().await.map_err(AppError::from)?;
        Ok(true)
    }

    async fn update_stripe_status(&self, id: Uuid, stripe_status: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE payment_transactions SET
                stripe_status = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(stripe_status)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
