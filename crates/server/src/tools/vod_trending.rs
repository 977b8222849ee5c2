//! vod_trending and vod_hot tool implementations.
//!
//! Ranked and hot listings by content type. These are not enveloped.

use rmcp::{ErrorData as McpError, model::*};
use vodgate_client::{HotParams, Proxy, TrendingParams};

use super::into_tool_result;

/// Implementation of the vod_trending tool.
pub async fn trending_impl(proxy: &Proxy, params: TrendingParams) -> Result<CallToolResult, McpError> {
    into_tool_result(proxy.handle_trending(&params).await)
}

/// Implementation of the vod_hot tool.
pub async fn hot_impl(proxy: &Proxy, params: HotParams) -> Result<CallToolResult, McpError> {
    into_tool_result(proxy.handle_hot(&params).await)
}
