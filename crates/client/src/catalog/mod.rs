//! Video catalog API client.
//!
//! Issues signed GET requests against the catalog API and classifies what
//! comes back.
//!
//! ### Protocol
//!
//! - **Endpoint**: `https://api.olelive.com/v1/pub/...`
//! - **Authentication**: every call carries the rotating token as `?_vv=`.
//! - **Headers**: the catalog only answers requests that look like they come
//!   from its own site (`Referer`/`Origin`).
//! - **Failure**: no automatic retry; a non-2xx or transport error is
//!   returned as [`UpstreamResult::UpstreamError`].

pub mod error;
pub mod request;
pub mod response;

pub use error::CatalogError;
pub use request::{ALLOWED_TYPE_IDS, DEFAULT_AMOUNT, Endpoint, Period, validate_type_id};
pub use response::{UpstreamResult, refine_keywords};

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;
use vodgate_core::AppConfig;

/// Default base URL for the catalog API.
const DEFAULT_BASE_URL: &str = "https://api.olelive.com/v1/pub";

/// Default site origin presented to the catalog.
const DEFAULT_SITE_ORIGIN: &str = "https://www.olevod.com/";

/// Default request timeout, applied uniformly to every endpoint.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL (default: https://api.olelive.com/v1/pub).
    pub base_url: String,
    /// Sent as Referer and Origin.
    pub site_origin: String,
    /// Request timeout (default: 30s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for CatalogConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.upstream_base_url.clone(),
            site_origin: config.site_origin.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Catalog API client.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    config: CatalogConfig,
}

impl CatalogClient {
    /// Create a new catalog client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| CatalogError::Network(Arc::new(e)))?;

        Ok(Self { http, base_url, config })
    }

    /// Call `endpoint` with token `vv` and classify the result.
    pub async fn call(&self, endpoint: &Endpoint, vv: &str) -> UpstreamResult {
        let url = match endpoint.url(&self.base_url, vv) {
            Ok(url) => url,
            Err(e) => return UpstreamResult::UpstreamError(e),
        };
        let headers = self.headers_for(endpoint);

        tracing::info!("catalog {} request: {}", endpoint.name(), url);
        let fetched = self.fetch(&url, headers.clone()).await;
        if let Err(e) = &fetched {
            tracing::error!(url = %url, headers = ?headers, error = %e, "catalog upstream error");
        }

        UpstreamResult::classify(endpoint, fetched)
    }

    /// Issue a single GET and decode the JSON body.
    ///
    /// No retry; any non-2xx status is an error.
    pub async fn fetch(&self, url: &Url, headers: HeaderMap) -> Result<Value, CatalogError> {
        let start = Instant::now();

        let response = self.http.get(url.clone()).headers(headers).send().await?;

        let status = response.status();
        tracing::debug!("catalog response status: {}", status);

        if !status.is_success() {
            return Err(CatalogError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&bytes).map_err(|e| CatalogError::Parse(e.to_string()))?;

        tracing::debug!("catalog call completed in {:?} ({} bytes)", start.elapsed(), bytes.len());

        Ok(payload)
    }

    /// Browser-like headers the catalog expects.
    fn headers_for(&self, endpoint: &Endpoint) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut insert = |name: header::HeaderName, value: &str| {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(name, value);
            }
        };

        insert(header::USER_AGENT, &self.config.user_agent);
        insert(header::REFERER, &self.config.site_origin);
        insert(header::ORIGIN, &self.config.site_origin);
        insert(header::ACCEPT, "application/json, text/plain, */*");

        if matches!(endpoint, Endpoint::Keywords { .. }) {
            insert(header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8,zh-TW;q=0.7");
            insert(header::HeaderName::from_static("sec-fetch-dest"), "empty");
            insert(header::HeaderName::from_static("sec-fetch-mode"), "cors");
            insert(header::HeaderName::from_static("sec-fetch-site"), "cross-site");
        }

        headers
    }
}
