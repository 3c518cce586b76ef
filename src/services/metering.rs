use crate::db::repositories::{ChatRepository, MessageRepository, UserRepository};
use crate::error::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

const MAX_TITLE_CHARS: usize = 80;

/// What a successful reservation bought: the turn may proceed and this many
/// tokens remain afterwards.
#[derive(Debug, Clone)]
pub struct TurnReservation {
    pub remaining_tokens: i32,
}

/// Admission control for chat turns. A turn is admitted by atomically
/// spending one token and recording the user's message; either both happen
/// or neither does.
#[derive(Clone)]
pub struct MeteringService {
    pool: PgPool,
    user_repo: UserRepository,
    chat_repo: ChatRepository,
    message_repo: MessageRepository,
}

impl MeteringService {
    pub fn new(
        pool: PgPool,
        user_repo: UserRepository,
        chat_repo: ChatRepository,
        message_repo: MessageRepository,
    ) -> Self {
        Self {
            pool,
            user_repo,
            chat_repo,
            message_repo,
        }
    }

    /// Admit one turn. Creates the chat on first contact, spends one token
    /// and stores the user message in a single transaction. Premium plans
    /// are not metered, so they skip the decrement. Exhausted balances roll
    /// the whole reservation back and surface as `InsufficientTokens`, so no
    /// message row is left behind for a turn that never ran.
    pub async fn reserve_turn(
        &self,
        user_id: &Uuid,
        chat_id: &Uuid,
        model: &str,
        user_content: &str,
    ) -> AppResult<TurnReservation> {
        if let Some(existing) = self.chat_repo.get_by_id(chat_id).await? {
            if existing.user_id != *user_id {
                return Err(AppError::NotFound(format!("Chat {} not found", chat_id)));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.chat_repo
            .create_if_absent_with_executor(chat_id, user_id, &title_from(user_content), model, &mut tx)
            .await?;

        let state = self
            .user_repo
            .get_metering_state_with_executor(user_id, &mut tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let remaining = if state.is_premium() {
            state.available_tokens
        } else {
            match self
                .user_repo
                .try_decrement_token_with_executor(user_id, &mut tx)
                .await?
            {
                Some(remaining) => remaining,
                None => {
                    // Dropping the transaction rolls it back, discarding the
                    // chat row if this was the first turn.
                    return Err(AppError::InsufficientTokens(
                        "No tokens available".to_string(),
                    ));
                }
            }
        };

        self.store_message(chat_id, "user", user_content, &serde_json::json!([]), &mut tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit reservation: {}", e)))?;

        Ok(TurnReservation {
            remaining_tokens: remaining,
        })
    }

    /// Store the assistant's side of a finished turn.
    pub async fn persist_assistant_turn(
        &self,
        chat_id: &Uuid,
        content: &str,
        parts: &serde_json::Value,
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.store_message(chat_id, "assistant", content, parts, &mut tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit assistant turn: {}", e)))?;

        Ok(())
    }

    /// Insert one side of a turn. Only the assistant side bumps
    /// `message_count`, so the counter stays equal to the number of
    /// persisted assistant messages: exactly one per completed turn.
    async fn store_message(
        &self,
        chat_id: &Uuid,
        role: &str,
        content: &str,
        parts: &serde_json::Value,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> AppResult<()> {
        self.message_repo
            .insert_with_executor(chat_id, role, content, parts, tx)
            .await?;
        if counts_toward_message_count(role) {
            self.chat_repo
                .increment_message_count_with_executor(chat_id, tx)
                .await?;
        }
        Ok(())
    }
}

/// `message_count` tracks persisted assistant messages; the user side of a
/// turn is stored without touching it.
fn counts_toward_message_count(role: &str) -> bool {
    role == "assistant"
}

fn title_from(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return "New chat".to_string();
    }
    trimmed.chars().take(MAX_TITLE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn titles_are_truncated_on_character_boundaries() {
        let long = "일정".repeat(100);
        let title = title_from(&long);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn only_assistant_messages_count_toward_message_count() {
        assert!(counts_toward_message_count("assistant"));
        assert!(!counts_toward_message_count("user"));
    }

    #[test]
    fn empty_messages_get_a_placeholder_title() {
        assert_eq!(title_from("   "), "New chat");
        assert_eq!(title_from("check my calendar"), "check my calendar");
    }
}
