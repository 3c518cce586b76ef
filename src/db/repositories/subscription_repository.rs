use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: Uuid,
    pub plan_type: String,
    pub payment_status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One subscription row per user; payment events overwrite it in place.
    pub async fn upsert(
        &self,
        user_id: &Uuid,
        plan_type: &str,
        payment_status: &str,
        start_date: &DateTime<Utc>,
        end_date: &DateTime<Utc>,
    ) -> Result<Subscription, AppError> {
        let result = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, plan_type, payment_status, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id)
            DO UPDATE SET plan_type = $2, payment_status = $3, end_date = $5
            RETURNING user_id, plan_type, payment_status, start_date, end_date
            "#,
        )
        .bind(user_id)
        .bind(plan_type)
        .bind(payment_status)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to upsert subscription: {}", e)))?;

        Ok(result)
    }
}
