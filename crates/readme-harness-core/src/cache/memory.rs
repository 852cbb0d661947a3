//! In-memory [`CacheStore`] for tests and single-process use.
//!
//! A `HashMap` behind `std::sync::RwLock`. Expired entries are ignored on
//! read and swept out on every write.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use super::CacheStore;
use crate::error::CacheError;

struct Entry {
    value: Value,
    /// `None` when the TTL is too large to represent: never expires.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError("in-memory cache lock poisoned".to_string())
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(Instant::now()))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_and_set() {
        let store = InMemoryCacheStore::new();
        assert!(store.is_empty());
        store
            .set("k", serde_json::json!({"a": 1}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(serde_json::json!({"a": 1})));
        assert_eq!(store.get("other").await.unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_never_visible() {
        let store = InMemoryCacheStore::new();
        store
            .set("k", serde_json::json!(1), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entries_swept_on_write() {
        let store = InMemoryCacheStore::new();
        for i in 0..10 {
            store
                .set(&format!("old-{}", i), serde_json::json!(i), Duration::ZERO)
                .await
                .unwrap();
        }
        store
            .set("fresh", serde_json::json!("x"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("fresh").await.unwrap(), Some(serde_json::json!("x")));
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let store = InMemoryCacheStore::new();
        store
            .set("k", serde_json::json!(1), Duration::MAX)
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(serde_json::json!(1)));
    }
}
