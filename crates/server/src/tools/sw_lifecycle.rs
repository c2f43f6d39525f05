//! sw_activate and sw_status tool implementations.

use gatekeeper_core::{CacheStorage, Network};
use gatekeeper_worker::{Gatekeeper, WorkerState};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub state: WorkerState,
    pub precache: String,
    pub runtime: String,
    /// Every store in the storage, in creation order.
    pub stores: Vec<String>,
    pub precache_entries: usize,
    pub runtime_entries: usize,
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<S: CacheStorage, N: Network>(worker: &Gatekeeper<S, N>) -> Result<CallToolResult, McpError> {
    let outcome = worker.activate().await?;
    json_result(&outcome)
}

/// Implementation of the sw_status tool.
pub async fn status_impl<S: CacheStorage, N: Network>(worker: &Gatekeeper<S, N>) -> Result<CallToolResult, McpError> {
    let names = worker.store_names();
    let storage = worker.storage();

    let output = SwStatusOutput {
        state: worker.state().await,
        precache: names.precache().to_string(),
        runtime: names.runtime().to_string(),
        stores: storage.keys().await?,
        precache_entries: storage.entries(names.precache()).await?.len(),
        runtime_entries: storage.entries(names.runtime()).await?.len(),
    };

    json_result(&output)
}
