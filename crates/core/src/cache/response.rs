//! Response cache over the key-value store.
//!
//! Entries are written on an upstream cache miss and overwritten by the
//! next write to the same key (last writer wins). An entry is dead once
//! `now > stored_at + ttl`, whether or not the store has evicted it yet.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keys::CacheKey;
use super::store::KvStore;
use crate::Error;
use crate::clock::Clock;
use crate::token::TOKEN_KEY;

/// Marker field added to responses served from the cache.
pub const CACHED_MARKER: &str = "cached";

/// A cached upstream payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub stored_at: i64,
    pub ttl: u64,
}

impl CacheEntry {
    pub fn expires_at(&self) -> i64 {
        self.stored_at.saturating_add(i64::try_from(self.ttl).unwrap_or(i64::MAX))
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at()
    }
}

/// Maps cache keys to previously fetched upstream payloads.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Look up a live entry.
    ///
    /// Unreadable entries are treated as misses so that a corrupt value
    /// never blocks a fresh fetch.
    pub async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, Error> {
        let Some(raw) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable cache entry");
                return Ok(None);
            }
        };

        if entry.is_expired(self.clock.unix_seconds()) {
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Store `payload` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheWrite` if the store cannot persist the entry.
    pub async fn store(&self, key: &CacheKey, payload: &Value, ttl: u64) -> Result<(), Error> {
        let entry = CacheEntry {
            key: key.to_string(),
            payload: payload.clone(),
            stored_at: self.clock.unix_seconds(),
            ttl,
        };
        let raw = serde_json::to_string(&entry).map_err(|e| Error::CacheWrite(e.to_string()))?;

        self.store
            .set(key.as_str(), &raw, ttl)
            .await
            .map_err(|e| match e {
                Error::CacheWrite(msg) => Error::CacheWrite(msg),
                other => Error::CacheWrite(other.to_string()),
            })
    }

    /// Remove a single entry. Returns whether a live entry existed.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool, Error> {
        self.store.delete(key.as_str()).await
    }

    /// Remove every response entry whose key matches `pattern`.
    ///
    /// The token slot is never touched. Returns the number of entries removed.
    pub async fn purge(&self, pattern: &str) -> Result<u64, Error> {
        let keys = self.store.keys_matching(pattern).await?;
        let mut deleted = 0u64;
        for key in keys.iter().filter(|k| k.as_str() != TOKEN_KEY) {
            if self.store.delete(key).await? {
                deleted += 1;
            }
        }
        tracing::debug!(pattern, deleted, "purged response cache");
        Ok(deleted)
    }
}

/// Tag a cache-derived payload without touching its own fields.
///
/// Non-object payloads are returned unchanged.
pub fn annotate_cached(mut payload: Value) -> Value {
    if let Value::Object(map) = &mut payload {
        map.insert(CACHED_MARKER.to_string(), Value::Bool(true));
    }
    payload
}
