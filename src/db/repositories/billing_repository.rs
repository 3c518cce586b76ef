use crate::error::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A stored-card billing agreement issued by the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    pub bid: String,
    pub user_id: Uuid,
    pub card_number_masked: String,
    pub card_issuer: String,
    pub next_payment_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_bid(&self, bid: &str) -> Result<Option<Billing>, AppError> {
        let result = sqlx::query_as::<_, Billing>(
            r#"
            SELECT bid, user_id, card_number_masked, card_issuer, next_payment_date
            FROM billings
            WHERE bid = $1
            "#,
        )
        .bind(bid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get billing record: {}", e)))?;

        Ok(result)
    }

    /// All billing agreements due on or before the given date.
    pub async fn list_due(&self, on_or_before: NaiveDate) -> Result<Vec<Billing>, AppError> {
        let result = sqlx::query_as::<_, Billing>(
            r#"
            SELECT bid, user_id, card_number_masked, card_issuer, next_payment_date
            FROM billings
            WHERE next_payment_date <= $1
            ORDER BY next_payment_date ASC
            "#,
        )
        .bind(on_or_before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list due billings: {}", e)))?;

        Ok(result)
    }

    pub async fn set_next_payment_date(
        &self,
        bid: &str,
        next_payment_date: NaiveDate,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE billings
            SET next_payment_date = $2
            WHERE bid = $1
            "#,
        )
        .bind(bid)
        .bind(next_payment_date)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to advance next payment date: {}", e)))?;

        Ok(())
    }
}
