//! Catalog API client error types.

use std::sync::Arc;

/// Errors from the upstream catalog API client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// A request parameter is outside what the catalog accepts.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Non-2xx HTTP response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body is not JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { CatalogError::Timeout } else { CatalogError::Network(Arc::new(err)) }
    }
}
