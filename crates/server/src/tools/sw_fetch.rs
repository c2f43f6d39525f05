//! sw_fetch tool implementation.
//!
//! Delivers one request to the worker's fetch hook. Requests the worker does
//! not intercept are sent to the network by the host, as a browser would.

use gatekeeper_client::resolve;
use gatekeeper_core::{CacheStorage, Error, Network, Request, RequestMode, Response};
use gatekeeper_worker::{FetchOutcome, Gatekeeper, ResponseSource, Route};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::json_result;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Request URL, absolute or relative to the page origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate" for document loads (default: "cors").
    #[serde(default)]
    pub mode: RequestMode,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// Whether the worker answered the request itself.
    pub intercepted: bool,
    pub route: Route,
    pub source: ResponseSource,
    pub status: u16,
    /// Final URL of the response.
    pub url: String,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    /// Body as text, when it is valid UTF-8.
    pub body: Option<String>,
}

impl SwFetchOutput {
    fn new(response: &Response, intercepted: bool, route: Route, source: ResponseSource) -> Self {
        Self {
            intercepted,
            route,
            source,
            status: response.status,
            url: response.url.clone(),
            content_type: response.content_type().map(str::to_string),
            body_bytes: response.body.len(),
            body: std::str::from_utf8(&response.body).ok().map(str::to_string),
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<S: CacheStorage, N: Network>(
    worker: &Gatekeeper<S, N>, network: &N, origin: &Url, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = Request::get(url).with_method(params.method.trim()).with_mode(params.mode);
    if let Some(accept) = params.accept {
        request = request.with_accept(accept);
    }

    let output = match worker.fetch(&request).await? {
        FetchOutcome::Served(served) => SwFetchOutput::new(&served.response, true, served.route, served.source),
        FetchOutcome::Passthrough => {
            let response = network.fetch(&request).await?;
            SwFetchOutput::new(&response, false, Route::Passthrough, ResponseSource::Network)
        }
    };

    json_result(&output)
}
