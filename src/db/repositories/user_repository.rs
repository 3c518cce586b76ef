use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub available_tokens: i32,
    pub primary_calendar_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GoogleCredentials {
    pub google_access_token: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_token_expires_at: Option<DateTime<Utc>>,
}

/// Metering view of a user: token balance plus the plan from the optional
/// subscription row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeteringState {
    pub available_tokens: i32,
    pub plan_type: Option<String>,
}

impl MeteringState {
    pub fn is_premium(&self) -> bool {
        self.plan_type.as_deref() == Some("premium")
    }
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>, AppError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, available_tokens, primary_calendar_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))?;

        Ok(result)
    }

    pub async fn get_metering_state(&self, user_id: &Uuid) -> Result<Option<MeteringState>, AppError> {
        let result = sqlx::query_as::<_, MeteringState>(
            r#"
            SELECT u.available_tokens, s.plan_type
            FROM users u
            LEFT JOIN subscriptions s ON s.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get metering state: {}", e)))?;

        Ok(result)
    }

    pub async fn get_metering_state_with_executor(
        &self,
        user_id: &Uuid,
        executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<MeteringState>, AppError> {
        let result = sqlx::query_as::<_, MeteringState>(
            r#"
            SELECT u.available_tokens, s.plan_type
            FROM users u
            LEFT JOIN subscriptions s ON s.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **executor)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get metering state: {}", e)))?;

        Ok(result)
    }

    /// Conditionally spend one token. Returns the remaining balance, or None
    /// when the balance was already exhausted (the row is left untouched).
    ///
    /// The `available_tokens > 0` guard in the UPDATE is what makes the
    /// check-and-decrement safe across concurrent requests and across server
    /// instances.
    pub async fn try_decrement_token_with_executor(
        &self,
        user_id: &Uuid,
        executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<i32>, AppError> {
        let result = sqlx::query_as::<_, (i32,)>(
            r#"
            UPDATE users
            SET available_tokens = available_tokens - 1, updated_at = NOW()
            WHERE id = $1 AND available_tokens > 0
            RETURNING available_tokens
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **executor)
        .await
        .map_err(|e| AppError::Database(format!("Failed to decrement token balance: {}", e)))?;

        Ok(result.map(|(remaining,)| remaining))
    }

    pub async fn add_tokens(&self, user_id: &Uuid, amount: i32) -> Result<i32, AppError> {
        let (balance,) = sqlx::query_as::<_, (i32,)>(
            r#"
            UPDATE users
            SET available_tokens = available_tokens + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING available_tokens
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to add tokens: {}", e)))?;

        Ok(balance)
    }

    pub async fn get_google_credentials(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<GoogleCredentials>, AppError> {
        let result = sqlx::query_as::<_, GoogleCredentials>(
            r#"
            SELECT google_access_token, google_refresh_token, google_token_expires_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get Google credentials: {}", e)))?;

        Ok(result)
    }

    pub async fn update_google_access_token(
        &self,
        user_id: &Uuid,
        access_token: &str,
        expires_at: &DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET google_access_token = $2, google_token_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update Google access token: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_plan_is_detected_from_subscription_join() {
        let premium = MeteringState {
            available_tokens: 0,
            plan_type: Some("premium".to_string()),
        };
        let free = MeteringState {
            available_tokens: 3,
            plan_type: Some("free".to_string()),
        };
        let missing = MeteringState {
            available_tokens: 3,
            plan_type: None,
        };

        assert!(premium.is_premium());
        assert!(!free.is_premium());
        assert!(!missing.is_premium());
    }
}
