//! MCP tool implementations.
//!
//! This module contains all tools exposed by the vodgate server.

pub mod cache;
pub mod vod_detail;
pub mod vod_keyword;
pub mod vod_search;
pub mod vod_trending;

use rmcp::{ErrorData as McpError, model::*};
use vodgate_client::ProxyResponse;

/// Wrap a proxy response as a tool result.
///
/// The full `{status, body, outcome}` JSON is returned either way; non-2xx
/// responses are flagged as tool errors.
pub(crate) fn into_tool_result(response: ProxyResponse) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| McpError::internal_error(format!("failed to serialize response: {e}"), None))?;

    if response.is_success() {
        Ok(CallToolResult::success(vec![Content::text(json)]))
    } else {
        Ok(CallToolResult::error(vec![Content::text(json)]))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use httpmock::MockServer;
    use rmcp::model::CallToolResult;
    use vodgate_client::{CatalogClient, CatalogConfig, Proxy, ProxyResponse};
    use vodgate_core::{AesGcmDecryptor, CacheDb, ManualClock};

    pub const NOW: i64 = 1_700_000_000;

    pub async fn proxy_for(server: &MockServer) -> (Proxy, CacheDb) {
        let clock = Arc::new(ManualClock::new(NOW));
        let db = CacheDb::open_in_memory_with_clock(clock.clone()).await.unwrap();
        let catalog = CatalogClient::new(CatalogConfig { base_url: server.base_url(), ..Default::default() }).unwrap();
        let decryptor = Arc::new(AesGcmDecryptor::new(&[9u8; 32]).unwrap());
        (Proxy::new(catalog, Arc::new(db.clone()), decryptor, clock), db)
    }

    pub fn response_of(result: &CallToolResult) -> ProxyResponse {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
