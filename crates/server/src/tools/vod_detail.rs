//! vod_detail tool implementation.

use rmcp::{ErrorData as McpError, model::*};
use vodgate_client::Proxy;
use vodgate_core::Envelope;

use super::into_tool_result;

/// Implementation of the vod_detail tool. Detail is always fetched fresh.
pub async fn detail_impl(proxy: &Proxy, envelope: Envelope) -> Result<CallToolResult, McpError> {
    into_tool_result(proxy.handle_detail(&envelope).await)
}
