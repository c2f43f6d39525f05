//! Network double for tool tests.

use gatekeeper_core::{Error, Network, Request, Response};
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;

/// Answers every request with `200` and a body naming the method and URL.
pub struct TestNetwork;

impl TestNetwork {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Network for TestNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        Ok(Response::new(request.url.as_str(), 200, format!("{} {}", request.method, request.url))
            .with_header("Content-Type", "text/plain"))
    }
}

/// Decode the JSON text content of a tool result.
pub fn output_of<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
