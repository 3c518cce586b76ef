use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub ai_model: String,
    pub message_count: i32,
    pub is_archived: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, chat_id: &Uuid) -> Result<Option<Chat>, AppError> {
        let result = sqlx::query_as::<_, Chat>(
            r#"
            SELECT id, user_id, title, ai_model, message_count, is_archived, created_at, updated_at
            FROM chats
            WHERE id = $1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get chat: {}", e)))?;

        Ok(result)
    }

    /// Create the chat row on the first turn of a conversation. The client
    /// supplies the chat id, so a second turn with the same id is a no-op.
    pub async fn create_if_absent_with_executor(
        &self,
        chat_id: &Uuid,
        user_id: &Uuid,
        title: &str,
        ai_model: &str,
        executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO chats (id, user_id, title, ai_model, message_count, is_archived, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, FALSE, NOW(), NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(title)
        .bind(ai_model)
        .execute(&mut **executor)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create chat: {}", e)))?;

        Ok(())
    }

    pub async fn increment_message_count_with_executor(
        &self,
        chat_id: &Uuid,
        executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE chats
            SET message_count = message_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(chat_id)
        .execute(&mut **executor)
        .await
        .map_err(|e| AppError::Database(format!("Failed to increment message count: {}", e)))?;

        Ok(())
    }
}
