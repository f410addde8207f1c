use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use redis::{AsyncCommands, aio::ConnectionManager};
use uuid::Uuid;

use crate::error::Result;
use crate::models::session::SessionRecord;

fn new_session_key() -> String {
    Uuid::new_v4().to_string()
}

fn record_for(user_id: i64, max_age: Duration) -> SessionRecord {
    let now = Utc::now();
    SessionRecord {
        user_id,
        created_at: now,
        expires_at: now + chrono::Duration::milliseconds(max_age.as_millis() as i64),
    }
}

/// Maps an opaque, cookie-carried session key to a stored user id.
///
/// Backends are swappable behind this trait; the only caller-visible
/// difference is durability across restarts. Expired entries behave as
/// absent whether or not they have been physically removed yet.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Generates a new opaque key, stores the session, and returns the key.
    async fn create(&self, user_id: i64) -> Result<String>;

    /// Returns the stored user id if the key exists and has not expired.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Removes the session. Idempotent.
    async fn destroy(&self, key: &str) -> Result<()>;
}

/// A volatile, in-process session store.
///
/// Backed by a sharded concurrent map, so operations on different keys do
/// not serialize against each other. Expiry is lazy: an expired entry is
/// dropped the first time it is read.
pub struct MemorySessionStore {
    entries: DashMap<String, SessionRecord>,
    max_age: Duration,
}

impl MemorySessionStore {
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_age,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: i64) -> Result<String> {
        let key = new_session_key();
        self.entries
            .insert(key.clone(), record_for(user_id, self.max_age));
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let live = match self.entries.get(key) {
            None => return Ok(None),
            Some(record) if record.is_expired() => None,
            Some(record) => Some(record.user_id),
        };

        if live.is_none() {
            self.entries.remove(key);
        }
        Ok(live)
    }

    async fn destroy(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A Redis-backed session store, durable across process restarts.
///
/// Records are stored as JSON under `session:{key}` with a server-side TTL,
/// so expiry needs no sweeping here.
pub struct RedisSessionStore {
    redis: ConnectionManager,
    max_age: Duration,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager, max_age: Duration) -> Self {
        Self { redis, max_age }
    }

    fn redis_key(key: &str) -> String {
        format!("session:{}", key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, user_id: i64) -> Result<String> {
        let key = new_session_key();
        let record = record_for(user_id, self.max_age);
        let json = sonic_rs::to_string(&record)
            .map_err(|e| crate::error::AppError::Internal(format!("session encode: {}", e)))?;

        let mut conn = self.redis.clone();
        let _: () = conn
            .set_ex(Self::redis_key(&key), json, self.max_age.as_secs().max(1))
            .await?;
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let mut conn = self.redis.clone();
        let json: Option<String> = conn.get(Self::redis_key(key)).await?;

        let Some(json) = json else {
            return Ok(None);
        };

        match sonic_rs::from_str::<SessionRecord>(&json) {
            Ok(record) if !record.is_expired() => Ok(Some(record.user_id)),
            // Unreadable or stale blob: treat as absent and drop it.
            _ => {
                let _: () = conn.del(Self::redis_key(key)).await.unwrap_or(());
                Ok(None)
            }
        }
    }

    async fn destroy(&self, key: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: () = conn.del(Self::redis_key(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn lifecycle_create_get_destroy() {
        let store = MemorySessionStore::new(Duration::from_secs(60));

        let key = store.create(42).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(42));

        store.destroy(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);

        // destroy is idempotent
        store.destroy(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_absent() {
        let store = MemorySessionStore::new(Duration::from_millis(40));

        let key = store.create(7).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(7));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_key_is_absent() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert_eq!(store.get("no-such-key").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_sessions_do_not_cross_contaminate() {
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));

        let mut tasks = JoinSet::new();
        for user_id in 0..1000i64 {
            let store = store.clone();
            tasks.spawn(async move {
                let key = store.create(user_id).await.unwrap();
                let read_back = store.get(&key).await.unwrap();
                (user_id, key, read_back)
            });
        }

        let mut keys = HashSet::new();
        while let Some(result) = tasks.join_next().await {
            let (user_id, key, read_back) = result.unwrap();
            assert_eq!(read_back, Some(user_id));
            assert!(keys.insert(key), "duplicate session key issued");
        }
        assert_eq!(keys.len(), 1000);
    }
}
