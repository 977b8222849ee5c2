//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and purging cached responses.

pub mod get;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
