//! The rotating `vv` token required on every catalog API call.
//!
//! [`derive`] is a pure function of the Unix timestamp. The upstream
//! validates the exact layout, so the bit slicing and the md5 offsets
//! below must not change.
//!
//! [`TokenCache`] keeps one token in the key-value store for five minutes
//! so the derivation runs at most once per window.

use std::sync::Arc;

use chrono::FixedOffset;
use md5::{Digest, Md5};
use tokio::sync::Mutex;

use crate::Error;
use crate::cache::KvStore;
use crate::clock::Clock;

/// Store key of the token slot.
pub const TOKEN_KEY: &str = "vv";

/// Lifetime of a cached token (5 minutes).
pub const TOKEN_TTL_SECS: u64 = 300;

/// Length of every derived token.
pub const TOKEN_LEN: usize = 32;

/// Upstream reads the timestamp on a UTC+2 clock.
const UPSTREAM_OFFSET_SECS: i32 = 2 * 3600;

/// Derive the token for `now_seconds`.
pub fn derive(now_seconds: i64) -> String {
    let t = now_seconds.to_string();

    // bits 2..=5 of each digit's 6-bit form, one string per bit position
    let mut bits: [String; 4] = Default::default();
    for ch in t.chars() {
        let digit = ch.to_digit(10).unwrap_or(0);
        let six = format!("{digit:06b}");
        for (i, column) in bits.iter_mut().enumerate() {
            column.push(six.as_bytes().get(2 + i).map_or('0', |&b| b as char));
        }
    }

    let a: Vec<String> = bits
        .iter()
        .map(|column| format!("{:03x}", u64::from_str_radix(column, 2).unwrap_or(0)))
        .collect();

    let n = hex::encode(Md5::digest(t.as_bytes()));

    let mut out = String::with_capacity(TOKEN_LEN);
    out.push_str(&n[0..3]);
    out.push_str(&a[0]);
    out.push_str(&n[6..11]);
    out.push_str(&a[1]);
    out.push_str(&n[14..19]);
    out.push_str(&a[2]);
    out.push_str(&n[22..27]);
    out.push_str(&a[3]);
    out.push_str(&n[30..]);
    out
}

fn upstream_seconds(clock: &dyn Clock) -> i64 {
    match FixedOffset::east_opt(UPSTREAM_OFFSET_SECS) {
        Some(offset) => clock.now().with_timezone(&offset).timestamp(),
        None => clock.unix_seconds(),
    }
}

/// Single-slot, store-backed token cache.
pub struct TokenCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl_secs: u64,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(store, clock, TOKEN_TTL_SECS)
    }

    pub fn with_ttl(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self { store, clock, ttl_secs, refresh: Mutex::new(()) }
    }

    /// Current token, deriving and storing a new one when the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheWrite` if a fresh token cannot be stored; the
    /// caller must not proceed with an unregistered token.
    pub async fn get(&self) -> Result<String, Error> {
        if let Some(token) = self.read_slot().await {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        if let Some(token) = self.read_slot().await {
            return Ok(token);
        }

        let token = derive(upstream_seconds(self.clock.as_ref()));

        self.store
            .set(TOKEN_KEY, &token, self.ttl_secs)
            .await
            .map_err(|e| Error::CacheWrite(format!("failed to store token: {e}")))?;

        tracing::debug!("refreshed upstream token");
        Ok(token)
    }

    async fn read_slot(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "token slot unreadable, deriving a new token");
                None
            }
        }
    }
}
