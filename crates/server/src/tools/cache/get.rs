//! cache_get tool implementation.
//!
//! Retrieves a live cached response by key.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vodgate_client::Proxy;
use vodgate_core::CacheEntry;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Full cache key, e.g. `search_test_1_4_2024-01-01`.
    pub key: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheGetOutput {
    /// The cached entry.
    pub entry: CacheEntry,
    /// Epoch seconds after which the entry is dead.
    pub expires_at: i64,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(proxy: &Proxy, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let entry = proxy
        .cached(&params.key)
        .await?
        .ok_or_else(|| McpError::resource_not_found(format!("no live cache entry for {}", params.key), None))?;

    let output = CacheGetOutput { expires_at: entry.expires_at(), entry };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize entry: {e}"), None))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
