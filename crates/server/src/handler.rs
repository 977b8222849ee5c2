//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl},
    vod_detail::detail_impl,
    vod_keyword::{keyword_impl, report_keyword_impl},
    vod_search::search_impl,
    vod_trending::{hot_impl, trending_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use vodgate_client::{HotParams, Proxy, TrendingParams};
use vodgate_core::Envelope;

/// The main MCP server handler for vodgate.
#[derive(Clone)]
pub struct VodgateServer {
    tool_router: ToolRouter<Self>,
    proxy: Proxy,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl VodgateServer {
    /// Create a new server handler around a configured proxy.
    pub fn new(proxy: Proxy) -> Self {
        Self { tool_router: Self::tool_router(), proxy }
    }

    /// Paged title search.
    #[tool(
        description = "Search the video catalog. Takes an envelope {timestamp, data} whose data decrypts to {keyword, page, size}. Results are cached per UTC day."
    )]
    async fn vod_search(&self, params: Parameters<Envelope>) -> Result<CallToolResult, McpError> {
        search_impl(&self.proxy, params.0).await
    }

    /// Related-keyword suggestions.
    #[tool(
        description = "Related keyword suggestions. Takes an envelope whose data decrypts to {keyword}. Suggestions are de-duplicated and sorted by length."
    )]
    async fn vod_keyword(&self, params: Parameters<Envelope>) -> Result<CallToolResult, McpError> {
        keyword_impl(&self.proxy, params.0).await
    }

    /// Report stale suggestions and refetch them.
    #[tool(
        description = "Report bad keyword suggestions. Drops today's cached suggestions for {keyword} and fetches them again."
    )]
    async fn vod_report_keyword(&self, params: Parameters<Envelope>) -> Result<CallToolResult, McpError> {
        report_keyword_impl(&self.proxy, params.0).await
    }

    /// Title detail.
    #[tool(description = "Fetch title detail. Takes an envelope whose data decrypts to {id}. Never cached.")]
    async fn vod_detail(&self, params: Parameters<Envelope>) -> Result<CallToolResult, McpError> {
        detail_impl(&self.proxy, params.0).await
    }

    /// Ranked listing.
    #[tool(
        description = "Ranked titles. period: day|week|month|all (default day); type_id: 1 film, 2 series, 3 variety, 4 anime; amount default 10."
    )]
    async fn vod_trending(&self, params: Parameters<TrendingParams>) -> Result<CallToolResult, McpError> {
        trending_impl(&self.proxy, params.0).await
    }

    /// Hot listing.
    #[tool(description = "Hot titles by type_id (1 film, 2 series, 3 variety, 4 anime); amount default 10.")]
    async fn vod_hot(&self, params: Parameters<HotParams>) -> Result<CallToolResult, McpError> {
        hot_impl(&self.proxy, params.0).await
    }

    /// Look up a cached response by key.
    #[tool(description = "Return the live cached response stored under a key.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.proxy, params.0).await
    }

    /// Purge cached responses by key glob.
    #[tool(description = "Delete cached responses whose keys match a glob pattern, e.g. search_* or keyword_2024-01-01_*.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.proxy, params.0).await
    }
}

impl ServerHandler for VodgateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "vodgate".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
