use crate::db::repositories::MessageRecord;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CachedMessages {
    messages: Vec<MessageRecord>,
    expires_at: DateTime<Utc>,
}

/// Read-through cache for a chat's message list, with TTL eviction and
/// explicit invalidation after a turn is persisted.
///
/// This is a soft-consistency structure: with multiple server instances a
/// peer's write becomes visible here only after the TTL window. Nothing
/// correctness-critical may depend on it.
#[derive(Clone)]
pub struct MessageCache {
    entries: Arc<DashMap<Uuid, CachedMessages>>,
    ttl: Duration,
}

impl MessageCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn get(&self, chat_id: &Uuid) -> Option<Vec<MessageRecord>> {
        let entry = self.entries.get(chat_id)?;
        if entry.expires_at <= Utc::now() {
            drop(entry);
            self.entries.remove(chat_id);
            return None;
        }
        Some(entry.messages.clone())
    }

    pub fn put(&self, chat_id: Uuid, messages: Vec<MessageRecord>) {
        self.entries.insert(
            chat_id,
            CachedMessages {
                messages,
                expires_at: Utc::now() + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, chat_id: &Uuid) {
        if self.entries.remove(chat_id).is_some() {
            debug!("Invalidated message cache for chat {}", chat_id);
        }
    }

    /// Drop every expired entry. Called opportunistically; correctness does
    /// not depend on it since `get` re-checks the deadline.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(chat_id: Uuid) -> MessageRecord {
        MessageRecord {
            id: Uuid::new_v4(),
            chat_id,
            role: "user".to_string(),
            content: "hello".to_string(),
            parts: serde_json::json!([]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn put_then_get_returns_the_entry_within_ttl() {
        let cache = MessageCache::new(60);
        let chat_id = Uuid::new_v4();
        cache.put(chat_id, vec![record(chat_id)]);

        let cached = cache.get(&chat_id).expect("entry should be fresh");
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].content, "hello");
    }

    #[test]
    fn zero_ttl_entries_are_already_expired() {
        let cache = MessageCache::new(0);
        let chat_id = Uuid::new_v4();
        cache.put(chat_id, vec![record(chat_id)]);
        assert!(cache.get(&chat_id).is_none());
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let cache = MessageCache::new(60);
        let chat_id = Uuid::new_v4();
        cache.put(chat_id, vec![record(chat_id)]);
        cache.invalidate(&chat_id);
        assert!(cache.get(&chat_id).is_none());
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let fresh = MessageCache::new(60);
        let chat_a = Uuid::new_v4();
        fresh.put(chat_a, vec![record(chat_a)]);
        fresh.purge_expired();
        assert_eq!(fresh.len(), 1);

        let stale = MessageCache::new(0);
        let chat_b = Uuid::new_v4();
        stale.put(chat_b, vec![record(chat_b)]);
        stale.purge_expired();
        assert!(stale.is_empty());
    }
}
