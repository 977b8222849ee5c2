//! Day-bucketed cache keys.
//!
//! Keys are plain concatenations so they stay observable in the store:
//! `<family>_..._<YYYY-MM-DD>`. Identical semantic fields on the same UTC
//! day produce the same key; the next day they produce a different one.

use std::fmt;

/// TTL shared by the search, keyword and trend families (24h).
pub const RESPONSE_TTL_SECS: u64 = 86_400;

/// A normalized query, one variant per endpoint family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Search { keyword: String, page: u32, size: u32 },
    Keyword { keyword: String },
    Trending { period: String, type_id: u8, amount: u32 },
    Hot { type_id: u8, amount: u32 },
}

impl Query {
    /// Family prefix shared by every key this query kind produces.
    pub fn family(&self) -> &'static str {
        match self {
            Query::Search { .. } => "search",
            Query::Keyword { .. } => "keyword",
            Query::Trending { .. } => "trending",
            Query::Hot { .. } => "trending_v2_cache",
        }
    }

    /// Build the cache key for this query inside the given day bucket.
    pub fn cache_key(&self, day: &str) -> CacheKey {
        let key = match self {
            Query::Search { keyword, page, size } => format!("search_{keyword}_{page}_{size}_{day}"),
            Query::Keyword { keyword } => format!("keyword_{day}_{keyword}"),
            Query::Trending { period, type_id, amount } => format!("trending_{day}_{period}_{type_id}_{amount}"),
            Query::Hot { type_id, amount } => format!("trending_v2_cache_{day}_{type_id}_{amount}"),
        };
        CacheKey(key)
    }
}

/// Deterministic key into the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey(key.to_string())
    }
}
