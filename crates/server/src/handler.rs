//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to
//! the worker's hooks.
use std::sync::Arc;

use crate::tools::{SwFetchParams, activate_impl, fetch_impl, status_impl};
use gatekeeper_client::FetchClient;
use gatekeeper_core::CacheDb;
use gatekeeper_worker::Gatekeeper;
use url::Url;

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

/// The worker as hosted by this binary.
pub type Worker = Gatekeeper<CacheDb, FetchClient>;

/// The main MCP server handler for the gatekeeper.
#[derive(Clone)]
pub struct GatekeeperServer {
    worker: Arc<Worker>,
    network: Arc<FetchClient>,
    origin: Url,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl GatekeeperServer {
    /// Create a new server handler.
    pub fn new(worker: Arc<Worker>, network: Arc<FetchClient>, origin: Url) -> Self {
        Self { worker, network, origin, tool_router: Self::tool_router() }
    }

    /// Deliver a request to the worker's fetch hook.
    #[tool(
        description = "Send a request through the offline worker. Returns the strategy used, where the response came from, and the response."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(self.worker.as_ref(), self.network.as_ref(), &self.origin, params.0).await
    }

    /// Activate an installed worker that is waiting.
    #[tool(description = "Activate the installed worker: delete caches of other versions and start intercepting requests.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(self.worker.as_ref()).await
    }

    /// Report lifecycle state and cache contents.
    #[tool(description = "Report the worker's lifecycle state, its current caches and every cache in storage.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(self.worker.as_ref()).await
    }
}

impl ServerHandler for GatekeeperServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "gatekeeper".into(),
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
