//! Cache gateway for resolved READMEs.
//!
//! The [`CacheStore`] trait is the generic key-value backend: string keys,
//! opaque JSON documents, a TTL on every write. [`ReadmeCache`] sits on top
//! of it and speaks in entity references and [`CachedReadme`] values.
//!
//! A negative result is stored in the same shape as a positive one, as a
//! [`ReadmeFile`] named [`NOT_FOUND_PLACEHOLDER`], so any backend that can
//! hold a document can hold "we looked, there is nothing".
//!
//! | Stored value | [`ReadmeCache::lookup`] |
//! |--------------|-------------------------|
//! | absent / expired | `None` |
//! | sentinel | `Some(CachedReadme::NotFound)` |
//! | document with content | `Some(CachedReadme::Found(_))` |

pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CacheError, ReadmeError};
use crate::models::{EntityRef, ReadmeFile, NOT_FOUND_PLACEHOLDER};

/// Generic get/set-with-TTL key-value store.
///
/// Implementations must never return an entry past its TTL. Eager
/// eviction is not required.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;
}

/// A cache entry for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedReadme {
    Found(ReadmeFile),
    NotFound,
}

impl CachedReadme {
    /// Storage form: the sentinel stands in for `NotFound`.
    pub fn into_file(self) -> ReadmeFile {
        match self {
            Self::Found(file) => file,
            Self::NotFound => ReadmeFile::not_found_placeholder(),
        }
    }

    pub fn from_file(file: ReadmeFile) -> Self {
        if file.is_placeholder() {
            Self::NotFound
        } else {
            Self::Found(file)
        }
    }
}

/// Entity-keyed view over a [`CacheStore`] with a single TTL for every write.
#[derive(Clone)]
pub struct ReadmeCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ReadmeCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the cached README for an entity.
    ///
    /// A sentinel comes back as [`CachedReadme::NotFound`]; turning that into
    /// a user-facing error is the caller's job. Entries that do not decode,
    /// or positive entries with empty content, read as absent.
    pub async fn lookup(&self, entity: &EntityRef) -> Result<Option<CachedReadme>, ReadmeError> {
        let key = entity.cache_key();
        let Some(value) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let file: ReadmeFile = match serde_json::from_value(value) {
            Ok(file) => file,
            Err(e) => {
                warn!(key = %key, error = %e, "ignoring undecodable README cache entry");
                return Ok(None);
            }
        };

        let cached = CachedReadme::from_file(file);
        if let CachedReadme::Found(ref file) = cached {
            if file.content.is_empty() {
                return Ok(None);
            }
        }
        let negative = matches!(cached, CachedReadme::NotFound);
        debug!(key = %key, negative, "README cache hit");
        Ok(Some(cached))
    }

    /// Cache a resolved README. Empty documents are not cached.
    pub async fn store_found(&self, entity: &EntityRef, file: &ReadmeFile) -> Result<(), ReadmeError> {
        if file.content.is_empty() || file.name == NOT_FOUND_PLACEHOLDER {
            debug!(entity = %entity, "not caching empty README");
            return Ok(());
        }
        self.write(entity, CachedReadme::Found(file.clone())).await
    }

    /// Cache a confirmed absence.
    pub async fn store_not_found(&self, entity: &EntityRef) -> Result<(), ReadmeError> {
        self.write(entity, CachedReadme::NotFound).await
    }

    async fn write(&self, entity: &EntityRef, entry: CachedReadme) -> Result<(), ReadmeError> {
        let value = serde_json::to_value(entry.into_file())
            .map_err(|e| CacheError(format!("failed to encode README: {}", e)))?;
        self.store.set(&entity.cache_key(), value, self.ttl).await?;
        Ok(())
    }
}
