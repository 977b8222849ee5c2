//! Request orchestration.
//!
//! Every enveloped request runs the same pipeline:
//!
//! 1. verify the envelope (freshness, then decryption)
//! 2. look the normalized query up in the response cache
//! 3. on a miss, take the current token and call the catalog
//! 4. store a non-empty result and respond
//!
//! Nothing is retried. A rejected envelope never reaches the cache or the
//! catalog; an upstream failure leaves the cache untouched; a zero-result
//! answer is reported as `{}` and not cached.

pub mod params;
pub mod response;

pub use params::{HotParams, TrendingParams};
pub use response::{Outcome, ProxyResponse};

use std::sync::Arc;

use serde_json::Value;
use vodgate_core::{
    AppConfig, CacheEntry, CacheKey, Clock, Decryptor, Envelope, EnvelopeVerifier, Error, KvStore, PlainRequest,
    Query, RejectReason, ResponseCache, TokenCache, cache::RESPONSE_TTL_SECS,
};

use crate::catalog::{CatalogClient, CatalogConfig, CatalogError, Endpoint, UpstreamResult};

/// Keyword the client UI sends before the user has typed anything.
const PLACEHOLDER_KEYWORD: &str = "your keyword";

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_SIZE: u32 = 4;

/// The signed, freshness-gated, cached catalog proxy.
#[derive(Clone)]
pub struct Proxy {
    catalog: CatalogClient,
    tokens: Arc<TokenCache>,
    verifier: Arc<EnvelopeVerifier>,
    cache: ResponseCache,
    clock: Arc<dyn Clock>,
    response_ttl: u64,
}

impl Proxy {
    /// Build a proxy with the default window and TTLs.
    pub fn new(
        catalog: CatalogClient, store: Arc<dyn KvStore>, decryptor: Arc<dyn Decryptor>, clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            tokens: Arc::new(TokenCache::new(store.clone(), clock.clone())),
            verifier: Arc::new(EnvelopeVerifier::new(decryptor, clock.clone())),
            cache: ResponseCache::new(store, clock.clone()),
            clock,
            response_ttl: RESPONSE_TTL_SECS,
        }
    }

    /// Build a proxy whose catalog client, window and TTLs come from `config`.
    pub fn from_config(
        config: &AppConfig, store: Arc<dyn KvStore>, decryptor: Arc<dyn Decryptor>, clock: Arc<dyn Clock>,
    ) -> Result<Self, CatalogError> {
        let catalog = CatalogClient::new(CatalogConfig::from(config))?;
        Ok(Self {
            catalog,
            tokens: Arc::new(TokenCache::with_ttl(store.clone(), clock.clone(), config.token_ttl_secs)),
            verifier: Arc::new(EnvelopeVerifier::with_window(
                decryptor,
                clock.clone(),
                config.freshness_window_secs,
            )),
            cache: ResponseCache::new(store, clock.clone()),
            clock,
            response_ttl: config.response_ttl_secs,
        })
    }

    /// Paged title search: `{keyword, page, size}`.
    pub async fn handle_search(&self, envelope: &Envelope) -> ProxyResponse {
        self.search(envelope).await.into()
    }

    /// Related-keyword suggestions: `{keyword}`.
    pub async fn handle_keyword(&self, envelope: &Envelope) -> ProxyResponse {
        self.keyword(envelope, false).await.into()
    }

    /// Drop today's cached suggestions for `{keyword}` and fetch them again.
    pub async fn handle_report_keyword(&self, envelope: &Envelope) -> ProxyResponse {
        self.keyword(envelope, true).await.into()
    }

    /// Title detail: `{id}`. Never cached.
    pub async fn handle_detail(&self, envelope: &Envelope) -> ProxyResponse {
        self.detail(envelope).await.into()
    }

    /// Ranked listing by period and content type.
    pub async fn handle_trending(&self, params: &TrendingParams) -> ProxyResponse {
        self.trending(params).await.into()
    }

    /// Hot listing by content type.
    pub async fn handle_hot(&self, params: &HotParams) -> ProxyResponse {
        self.hot(params).await.into()
    }

    /// Delete every cached response whose key matches the glob `pattern`.
    pub async fn purge(&self, pattern: &str) -> Result<u64, Error> {
        let deleted = self.cache.purge(pattern).await?;
        tracing::info!(pattern, deleted, "purged cached responses");
        Ok(deleted)
    }

    /// The live cache entry stored under `key`, if any.
    pub async fn cached(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        self.cache.lookup(&CacheKey::from(key)).await
    }

    async fn search(&self, envelope: &Envelope) -> Result<ProxyResponse, Error> {
        let plain = self.verifier.verify(envelope).await?;
        let keyword = plain.string("keyword")?;
        if is_placeholder(&keyword) {
            return Ok(ProxyResponse::no_result());
        }
        let page = optional_integer(&plain, "page", DEFAULT_PAGE)?;
        let size = optional_integer(&plain, "size", DEFAULT_SIZE)?;

        let query = Query::Search { keyword: keyword.clone(), page, size };
        self.serve_cached(&query, &Endpoint::Search { keyword, page, size }).await
    }

    async fn keyword(&self, envelope: &Envelope, refresh: bool) -> Result<ProxyResponse, Error> {
        let plain = self.verifier.verify(envelope).await?;
        let keyword = plain.string("keyword")?;
        if is_placeholder(&keyword) {
            return Ok(ProxyResponse::no_result());
        }

        let query = Query::Keyword { keyword: keyword.clone() };
        if refresh {
            let key = query.cache_key(&self.clock.day_bucket());
            let removed = self.cache.invalidate(&key).await?;
            tracing::info!(key = %key, removed, "keyword suggestions reported");
        }
        self.serve_cached(&query, &Endpoint::Keywords { keyword }).await
    }

    async fn detail(&self, envelope: &Envelope) -> Result<ProxyResponse, Error> {
        let plain = self.verifier.verify(envelope).await?;
        let id = plain.string("id")?;
        if id.is_empty() {
            return Err(Error::rejected(RejectReason::MissingField("id".into())));
        }

        match self.fetch(&Endpoint::Detail { id }).await? {
            Some(payload) => Ok(ProxyResponse::fresh(payload)),
            None => Ok(ProxyResponse::no_result()),
        }
    }

    async fn trending(&self, params: &TrendingParams) -> Result<ProxyResponse, Error> {
        let (period, type_id, amount) = params.resolve()?;
        let query = Query::Trending { period: period.to_string(), type_id, amount };
        self.serve_cached(&query, &Endpoint::Rank { period, type_id, amount }).await
    }

    async fn hot(&self, params: &HotParams) -> Result<ProxyResponse, Error> {
        let (type_id, amount) = params.resolve()?;
        self.serve_cached(&Query::Hot { type_id, amount }, &Endpoint::Hot { type_id, amount }).await
    }

    /// Cache lookup, then fetch-and-store on a miss.
    ///
    /// The store is best-effort: a failed lookup is treated as a miss and a
    /// failed write is logged while the fresh payload is still returned.
    async fn serve_cached(&self, query: &Query, endpoint: &Endpoint) -> Result<ProxyResponse, Error> {
        let key = query.cache_key(&self.clock.day_bucket());
        let family = query.family();

        match self.cache.lookup(&key).await {
            Ok(Some(entry)) => {
                tracing::debug!(family, key = %key, "cache hit");
                return Ok(ProxyResponse::cached(entry.payload));
            }
            Ok(None) => tracing::debug!(family, key = %key, "cache miss"),
            Err(e) => tracing::warn!(key = %key, error = %e, "cache lookup failed, fetching from upstream"),
        }

        let Some(payload) = self.fetch(endpoint).await? else {
            tracing::info!(key = %key, "upstream returned no results");
            return Ok(ProxyResponse::no_result());
        };

        if let Err(e) = self.cache.store(&key, &payload, self.response_ttl).await {
            tracing::warn!(key = %key, error = %e, "failed to cache upstream response");
        }

        Ok(ProxyResponse::fresh(payload))
    }

    /// Signed upstream call. `None` means upstream reported zero results.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Option<Value>, Error> {
        let vv = self.tokens.get().await?;

        match self.catalog.call(endpoint, &vv).await {
            UpstreamResult::Success(payload) => Ok(Some(payload)),
            UpstreamResult::Empty(_) => Ok(None),
            UpstreamResult::UpstreamError(e) => Err(Error::Upstream(e.to_string())),
        }
    }
}

fn is_placeholder(keyword: &str) -> bool {
    let keyword = keyword.trim();
    keyword.is_empty() || keyword == PLACEHOLDER_KEYWORD
}

fn optional_integer(plain: &PlainRequest, field: &str, default: u32) -> Result<u32, Error> {
    match plain.get(field) {
        Some(_) => plain.integer(field),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::{
        Aes256Gcm,
        aead::{Aead, KeyInit, generic_array::GenericArray},
    };
    use async_trait::async_trait;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vodgate_core::token::{TOKEN_KEY, derive};
    use vodgate_core::{AesGcmDecryptor, CacheDb, ManualClock};

    const NOW: i64 = 1_700_000_000;
    const TODAY: &str = "2023-11-14";
    const KEY: [u8; 32] = [42u8; 32];

    fn seal(plaintext: &Value) -> String {
        let cipher = Aes256Gcm::new_from_slice(&KEY).unwrap();
        let nonce = [3u8; 12];
        let mut out = nonce.to_vec();
        out.extend(
            cipher
                .encrypt(GenericArray::from_slice(&nonce), plaintext.to_string().as_bytes())
                .unwrap(),
        );
        STANDARD.encode(out)
    }

    fn envelope(age: i64, plaintext: Value) -> Envelope {
        Envelope::new(NOW - age, seal(&plaintext))
    }

    struct Harness {
        proxy: Proxy,
        db: CacheDb,
        clock: Arc<ManualClock>,
    }

    async fn harness(server: &MockServer) -> Harness {
        let clock = Arc::new(ManualClock::new(NOW));
        let db = CacheDb::open_in_memory_with_clock(clock.clone()).await.unwrap();
        let proxy = proxy_over(server, Arc::new(db.clone()), clock.clone());
        Harness { proxy, db, clock }
    }

    fn proxy_over(server: &MockServer, store: Arc<dyn KvStore>, clock: Arc<ManualClock>) -> Proxy {
        let catalog = CatalogClient::new(CatalogConfig { base_url: server.base_url(), ..Default::default() }).unwrap();
        Proxy::new(catalog, store, Arc::new(AesGcmDecryptor::new(&KEY).unwrap()), clock)
    }

    #[tokio::test]
    async fn test_search_then_cached() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/index/search/test/vod/0/1/4")
                    .query_param("_vv", derive(NOW));
                then.status(200)
                    .json_body(json!({"code": 0, "msg": "ok", "data": {"total": 2, "data": [{"id": 1}, {"id": 2}]}}));
            })
            .await;
        let h = harness(&server).await;
        let query = json!({"keyword": "test", "page": 1, "size": 4});

        let first = h.proxy.handle_search(&envelope(5, query.clone())).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.outcome, Outcome::Fresh);
        assert_eq!(first.body["data"]["total"], json!(2));
        assert!(first.body.get("cached").is_none());
        assert!(h.db.exists(&format!("search_test_1_4_{TODAY}")).await.unwrap());

        let second = h.proxy.handle_search(&envelope(1, query)).await;
        assert_eq!(second.status, 200);
        assert_eq!(second.outcome, Outcome::Cached);
        assert_eq!(second.body["cached"], json!(true));
        assert_eq!(second.body["msg"], json!("ok"));
        assert_eq!(second.body["data"], first.body["data"]);

        upstream.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_stale_envelope_rejected_without_side_effects() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({"data": {"total": 1}}));
            })
            .await;
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(CountingStore::new(CacheDb::open_in_memory_with_clock(clock.clone()).await.unwrap()));
        let proxy = proxy_over(&server, store.clone(), clock);

        let response = proxy.handle_search(&envelope(90, json!({"keyword": "test", "page": 1, "size": 4}))).await;

        assert_eq!(response.status, 400);
        assert_eq!(response.outcome, Outcome::Rejected);
        assert_eq!(response.body, json!({"error": "Invalid Request, expired"}));
        upstream.assert_hits_async(0).await;
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
        assert_eq!(store.sets.load(Ordering::SeqCst), 0);
        assert!(store.inner.keys_matching("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_cache_untouched() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/test/vod/0/1/4");
                then.status(500);
            })
            .await;
        let h = harness(&server).await;

        let response = h.proxy.handle_search(&envelope(5, json!({"keyword": "test", "page": 1, "size": 4}))).await;

        assert_eq!(response.status, 503);
        assert_eq!(response.outcome, Outcome::Failed);
        assert_eq!(response.body, json!({"error": "Upstream Error"}));
        upstream.assert_hits_async(1).await;
        assert!(h.db.keys_matching("search_*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_not_cached() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/nothing/vod/0/1/4");
                then.status(200).json_body(json!({"code": 0, "data": {"total": 0, "data": []}}));
            })
            .await;
        let h = harness(&server).await;
        let query = json!({"keyword": "nothing", "page": 1, "size": 4});

        for _ in 0..2 {
            let response = h.proxy.handle_search(&envelope(5, query.clone())).await;
            assert_eq!(response.status, 200);
            assert_eq!(response.outcome, Outcome::NoResult);
            assert_eq!(response.body, json!({}));
        }

        upstream.assert_hits_async(2).await;
        assert!(!h.db.exists(&format!("search_nothing_1_4_{TODAY}")).await.unwrap());
    }

    #[tokio::test]
    async fn test_next_day_misses_cache() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/test/vod/0/1/4");
                then.status(200).json_body(json!({"data": {"total": 1}}));
            })
            .await;
        let h = harness(&server).await;
        let query = json!({"keyword": "test", "page": 1, "size": 4});

        h.proxy.handle_search(&envelope(0, query.clone())).await;
        h.clock.advance(86_400);
        let next_day = Envelope::new(NOW + 86_400, seal(&query));
        let response = h.proxy.handle_search(&next_day).await;

        assert_eq!(response.outcome, Outcome::Fresh);
        upstream.assert_hits_async(2).await;
        assert!(h.db.exists("search_test_1_4_2023-11-15").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_defaults_page_and_size() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/test/vod/0/1/4");
                then.status(200).json_body(json!({"data": {"total": 1}}));
            })
            .await;
        let h = harness(&server).await;

        let response = h.proxy.handle_search(&envelope(5, json!({"keyword": "test"}))).await;

        assert_eq!(response.status, 200);
        upstream.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_placeholder_keyword_short_circuits() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({}));
            })
            .await;
        let h = harness(&server).await;

        for keyword in ["", "your keyword"] {
            let response = h.proxy.handle_keyword(&envelope(5, json!({"keyword": keyword}))).await;
            assert_eq!(response.status, 200);
            assert_eq!(response.body, json!({}));
        }

        upstream.assert_hits_async(0).await;
        assert!(h.db.keys_matching("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_keyword_rejected() {
        let server = MockServer::start_async().await;
        let h = harness(&server).await;

        let response = h.proxy.handle_search(&envelope(5, json!({"page": 1}))).await;
        assert_eq!(response.status, 400);
        assert_eq!(response.body, json!({"error": "Invalid Request, missing field: keyword"}));
    }

    #[tokio::test]
    async fn test_keyword_refined_and_cached() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/keywords/a");
                then.status(200)
                    .json_body(json!({"code": 0, "data": [{"words": ["a", "", "b", "a", "ccc"]}]}));
            })
            .await;
        let h = harness(&server).await;

        let response = h.proxy.handle_keyword(&envelope(5, json!({"keyword": "a"}))).await;
        assert_eq!(response.outcome, Outcome::Fresh);
        assert_eq!(response.body["data"][0]["words"], json!(["b", "ccc"]));

        let cached = h.proxy.handle_keyword(&envelope(5, json!({"keyword": "a"}))).await;
        assert_eq!(cached.outcome, Outcome::Cached);
        assert_eq!(cached.body["data"][0]["words"], json!(["b", "ccc"]));

        upstream.assert_hits_async(1).await;
        assert!(h.db.exists(&format!("keyword_{TODAY}_a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_report_keyword_refetches() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/keywords/a");
                then.status(200).json_body(json!({"data": [{"words": ["ab"]}]}));
            })
            .await;
        let h = harness(&server).await;

        h.proxy.handle_keyword(&envelope(5, json!({"keyword": "a"}))).await;
        let reported = h.proxy.handle_report_keyword(&envelope(5, json!({"keyword": "a"}))).await;

        assert_eq!(reported.outcome, Outcome::Fresh);
        upstream.assert_hits_async(2).await;
        assert!(h.db.exists(&format!("keyword_{TODAY}_a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_detail_not_cached() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/vod/detail/777/true");
                then.status(200).json_body(json!({"data": {"id": 777, "name": "x"}}));
            })
            .await;
        let h = harness(&server).await;

        for _ in 0..2 {
            let response = h.proxy.handle_detail(&envelope(5, json!({"id": 777}))).await;
            assert_eq!(response.outcome, Outcome::Fresh);
            assert_eq!(response.body["data"]["id"], json!(777));
        }

        upstream.assert_hits_async(2).await;
        assert_eq!(h.db.keys_matching("*").await.unwrap(), vec!["vv".to_string()]);
    }

    #[tokio::test]
    async fn test_trending_cached_under_family_key() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET).path("/index/vod/data/rank/week/2/10");
                then.status(200).json_body(json!({"data": [{"id": 1}]}));
            })
            .await;
        let h = harness(&server).await;
        let params = TrendingParams { period: Some("week".into()), type_id: Some(2), amount: None };

        assert_eq!(h.proxy.handle_trending(&params).await.outcome, Outcome::Fresh);
        assert_eq!(h.proxy.handle_trending(&params).await.outcome, Outcome::Cached);

        upstream.assert_hits_async(1).await;
        assert!(h.db.exists(&format!("trending_{TODAY}_week_2_10")).await.unwrap());
    }

    #[tokio::test]
    async fn test_trending_invalid_params() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({"data": [{"id": 1}]}));
            })
            .await;
        let h = harness(&server).await;

        let bad_period = TrendingParams { period: Some("year".into()), type_id: Some(1), amount: None };
        assert_eq!(h.proxy.handle_trending(&bad_period).await.status, 400);

        let bad_type = HotParams { type_id: Some(5), amount: None };
        assert_eq!(h.proxy.handle_hot(&bad_type).await.status, 400);

        upstream.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_hot_cached_under_v2_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/index/vod/hot/1/0/20");
                then.status(200).json_body(json!({"data": [{"id": 9}]}));
            })
            .await;
        let h = harness(&server).await;

        let response = h.proxy.handle_hot(&HotParams { type_id: Some(1), amount: Some(20) }).await;

        assert_eq!(response.outcome, Outcome::Fresh);
        assert!(h.db.exists(&format!("trending_v2_cache_{TODAY}_1_20")).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_by_pattern() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/index/search/");
                then.status(200).json_body(json!({"data": {"total": 3}}));
            })
            .await;
        let h = harness(&server).await;

        for keyword in ["one", "two"] {
            h.proxy.handle_search(&envelope(5, json!({"keyword": keyword}))).await;
        }

        assert_eq!(h.proxy.purge("search_*").await.unwrap(), 2);
        assert!(h.db.keys_matching("search_*").await.unwrap().is_empty());
        assert!(matches!(h.proxy.purge("").await, Err(Error::InvalidPattern(_))));
    }

    #[tokio::test]
    async fn test_purge_all_spares_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/test/vod/0/1/4");
                then.status(200).json_body(json!({"data": {"total": 1}}));
            })
            .await;
        let h = harness(&server).await;

        h.proxy.handle_search(&envelope(5, json!({"keyword": "test"}))).await;

        assert_eq!(h.proxy.purge("*").await.unwrap(), 1);
        assert_eq!(h.db.get(TOKEN_KEY).await.unwrap(), Some(derive(NOW)));
    }

    /// Counts reads and writes reaching a real store.
    struct CountingStore {
        inner: CacheDb,
        gets: AtomicUsize,
        sets: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: CacheDb) -> Self {
            Self { inner, gets: AtomicUsize::new(0), sets: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl KvStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), Error> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value, ttl_secs).await
        }

        async fn delete(&self, key: &str) -> Result<bool, Error> {
            self.inner.delete(key).await
        }

        async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, Error> {
            self.inner.keys_matching(pattern).await
        }
    }

    /// Wraps a real store and refuses writes to keys with a given prefix.
    struct RefusingStore {
        inner: CacheDb,
        refuse: &'static str,
    }

    #[async_trait]
    impl KvStore for RefusingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), Error> {
            if key.starts_with(self.refuse) {
                return Err(Error::CacheWrite("store unavailable".into()));
            }
            self.inner.set(key, value, ttl_secs).await
        }

        async fn delete(&self, key: &str) -> Result<bool, Error> {
            self.inner.delete(key).await
        }

        async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, Error> {
            self.inner.keys_matching(pattern).await
        }
    }

    #[tokio::test]
    async fn test_token_store_failure_aborts_upstream_call() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({"data": {"total": 1}}));
            })
            .await;
        let clock = Arc::new(ManualClock::new(NOW));
        let inner = CacheDb::open_in_memory_with_clock(clock.clone()).await.unwrap();
        let proxy = proxy_over(&server, Arc::new(RefusingStore { inner, refuse: "vv" }), clock);

        let response = proxy.handle_search(&envelope(5, json!({"keyword": "test"}))).await;

        assert_eq!(response.status, 503);
        assert_eq!(response.body, json!({"error": "Service Unavailable"}));
        upstream.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_response_store_failure_still_served() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/index/search/test/vod/0/1/4");
                then.status(200).json_body(json!({"data": {"total": 1}}));
            })
            .await;
        let clock = Arc::new(ManualClock::new(NOW));
        let inner = CacheDb::open_in_memory_with_clock(clock.clone()).await.unwrap();
        let proxy = proxy_over(&server, Arc::new(RefusingStore { inner, refuse: "search_" }), clock);

        let response = proxy.handle_search(&envelope(5, json!({"keyword": "test"}))).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.outcome, Outcome::Fresh);
        assert_eq!(response.body["data"]["total"], json!(1));
    }

    #[tokio::test]
    async fn test_decrypt_failure_reason() {
        let server = MockServer::start_async().await;
        let h = harness(&server).await;

        let response = h.proxy.handle_detail(&Envelope::new(NOW, "bm90IGEgcmVhbCBjaXBoZXJ0ZXh0IGF0IGFsbA==")).await;

        assert_eq!(response.status, 400);
        assert_eq!(response.body, json!({"error": "Invalid Request, decrypt"}));
        assert!(matches!(
            ProxyResponse::from_error(&Error::rejected(RejectReason::Decrypt)).outcome,
            Outcome::Rejected
        ));
    }
}
