//! vod_search tool implementation.
//!
//! Paged title search through the cached, signed proxy.

use rmcp::{ErrorData as McpError, model::*};
use vodgate_client::Proxy;
use vodgate_core::Envelope;

use super::into_tool_result;

/// Implementation of the vod_search tool.
///
/// The envelope must decrypt to `{"keyword": ..., "page": ..., "size": ...}`.
pub async fn search_impl(proxy: &Proxy, envelope: Envelope) -> Result<CallToolResult, McpError> {
    into_tool_result(proxy.handle_search(&envelope).await)
}
