//! SQLite-backed key-value store and the response cache built on it.
//!
//! - Redis-style `KvStore` operations with per-key TTL
//! - Day-bucketed cache keys per endpoint family
//! - Automatic schema migrations, WAL mode for concurrent access

pub mod connection;
pub mod keys;
pub mod migrations;
pub mod response;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use keys::{CacheKey, Query, RESPONSE_TTL_SECS};
pub use response::{CACHED_MARKER, CacheEntry, ResponseCache, annotate_cached};
pub use store::KvStore;
