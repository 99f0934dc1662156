pub mod http;


use crate::errors::Result;
use crate::page::{Request, Response};
use crate::redirect::RedirectGate;
use async_trait::async_trait;

pub use http::HttpTransport;

/// Executes requests on behalf of a browser.
///
/// Implementations must ask the gate before following each redirect hop and
/// return its error unchanged when it refuses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &Request, gate: &RedirectGate) -> Result<Response>;
}
