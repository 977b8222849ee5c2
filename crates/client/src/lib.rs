//! Upstream client and request orchestration for vodgate.
//!
//! This crate provides the signed catalog API client and the proxy that
//! composes it with envelope verification, the token slot and the response
//! cache from `vodgate-core`.

pub mod catalog;
pub mod proxy;

pub use catalog::{CatalogClient, CatalogConfig, CatalogError, Endpoint, Period, UpstreamResult, refine_keywords};
pub use proxy::{HotParams, Outcome, Proxy, ProxyResponse, TrendingParams};
