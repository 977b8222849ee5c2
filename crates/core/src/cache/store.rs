//! Key-value store with per-key expiry.
//!
//! [`KvStore`] is the seam shared by the token slot and the response cache.
//! [`CacheDb`] implements it over SQLite; rows past `expires_at` are
//! invisible to every read and removed by [`CacheDb::purge_expired`].

use super::connection::CacheDb;
use crate::Error;
use async_trait::async_trait;
use tokio_rusqlite::params;

/// Redis-style key-value store operations.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get a live value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key` for `ttl_secs`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), Error>;

    /// Remove `key`. Returns whether a live entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, Error>;

    /// Live keys matching a glob pattern (`*`, `?`, `[...]`).
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, Error>;

    async fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.get(key).await?.is_some())
    }
}

#[async_trait]
impl KvStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        let now = self.clock.unix_seconds();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1 AND expires_at > ?2")?;

                let result = stmt.query_row(params![key, now], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();
        let stored_at = self.clock.unix_seconds();
        let expires_at = stored_at.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX));

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_store (key, value, stored_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        stored_at = excluded.stored_at,
                        expires_at = excluded.expires_at",
                    params![key, value, stored_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| Error::CacheWrite(Error::from(e).to_string()))
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        let now = self.clock.unix_seconds();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let live: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM kv_store WHERE key = ?1 AND expires_at > ?2)",
                    params![key, now],
                    |row| row.get(0),
                )?;
                conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                Ok(live)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, Error> {
        if pattern.trim().is_empty() {
            return Err(Error::InvalidPattern("pattern cannot be empty".into()));
        }

        let pattern = pattern.to_string();
        let now = self.clock.unix_seconds();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT key FROM kv_store WHERE key GLOB ?1 AND expires_at > ?2 ORDER BY key")?;
                let keys = stmt
                    .query_map(params![pattern, now], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Delete expired entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = self.clock.unix_seconds();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM kv_store WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
