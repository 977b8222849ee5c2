//! vod_keyword and vod_report_keyword tool implementations.
//!
//! Related-keyword suggestions, cached per UTC day. Reporting a keyword
//! drops today's cached list and fetches it again.

use rmcp::{ErrorData as McpError, model::*};
use vodgate_client::Proxy;
use vodgate_core::Envelope;

use super::into_tool_result;

/// Implementation of the vod_keyword tool.
pub async fn keyword_impl(proxy: &Proxy, envelope: Envelope) -> Result<CallToolResult, McpError> {
    into_tool_result(proxy.handle_keyword(&envelope).await)
}

/// Implementation of the vod_report_keyword tool.
pub async fn report_keyword_impl(proxy: &Proxy, envelope: Envelope) -> Result<CallToolResult, McpError> {
    into_tool_result(proxy.handle_report_keyword(&envelope).await)
}
