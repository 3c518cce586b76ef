use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A persisted chat turn message. `parts` carries the structured payload of
/// the turn (tool invocations and their results) exactly as streamed to the
/// client; the server never reinterprets it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: String,
    pub content: String,
    pub parts: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_with_executor(
        &self,
        chat_id: &Uuid,
        role: &str,
        content: &str,
        parts: &serde_json::Value,
        executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<MessageRecord, AppError> {
        let result = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, chat_id, role, content, parts, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, chat_id, role, content, parts, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(role)
        .bind(content)
        .bind(parts)
        .fetch_one(&mut **executor)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert message: {}", e)))?;

        Ok(result)
    }

    /// Messages in creation order; this is the order they are replayed to the
    /// model on every turn.
    pub async fn list_for_chat(&self, chat_id: &Uuid) -> Result<Vec<MessageRecord>, AppError> {
        let result = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, chat_id, role, content, parts, created_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list messages: {}", e)))?;

        Ok(result)
    }
}
