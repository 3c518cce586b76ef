use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// One charge attempt against a billing agreement. Rows are append-only:
/// nothing in the application updates or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: Uuid,
    pub bid: String,
    pub amount: i64,
    pub status: String,
    pub gateway_tid: Option<String>,
    pub result_code: Option<String>,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        bid: &str,
        amount: i64,
        status: &str,
        gateway_tid: Option<&str>,
        result_code: Option<&str>,
    ) -> Result<TransactionRecord, AppError> {
        let result = sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (id, bid, amount, status, gateway_tid, result_code, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id, bid, amount, status, gateway_tid, result_code, scheduled_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(bid)
        .bind(amount)
        .bind(status)
        .bind(gateway_tid)
        .bind(result_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to record transaction: {}", e)))?;

        Ok(result)
    }

    /// Whether any charge attempt exists for this agreement since the given
    /// instant. This query is the data-store-level duplicate guard for the
    /// daily batch, so it deliberately matches every status.
    pub async fn has_transaction_since(
        &self,
        bid: &str,
        since: &DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*)
            FROM transactions
            WHERE bid = $1 AND scheduled_at >= $2
            "#,
        )
        .bind(bid)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to query same-day transactions: {}", e)))?;

        Ok(result.0 > 0)
    }
}
