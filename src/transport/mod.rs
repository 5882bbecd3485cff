//! Network transport
//!
//! The resource cache and offline queue only reach the network through
//! [`Transport`], so hosts and tests can substitute their own.

mod http;
mod scripted;

pub use http::HttpTransport;
pub use scripted::ScriptedTransport;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Request, Response};

/// Performs a request. Any received response, whatever its status, is `Ok`;
/// `Err` means the request never completed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}
