//! Network collaborator.

use crate::{Error, Request, Response};

/// Performs the real network round trip for an intercepted request.
///
/// Any HTTP status counts as a response; `Err` means no response arrived
/// (connection refused, DNS failure, body too large).
#[async_trait::async_trait]
pub trait Network: Send + Sync + 'static {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
