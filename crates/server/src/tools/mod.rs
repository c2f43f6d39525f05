//! MCP tool implementations.
//!
//! Each tool drives one hook of the worker or reports on its state.
#![allow(unused_imports)]

pub mod sw_fetch;
pub mod sw_lifecycle;

#[cfg(test)]
pub(crate) mod test_network;

use gatekeeper_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use sw_fetch::{SwFetchOutput, SwFetchParams, fetch_impl};
pub use sw_lifecycle::{SwStatusOutput, activate_impl, status_impl};

/// Serialize a tool output as pretty JSON text content.
fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
