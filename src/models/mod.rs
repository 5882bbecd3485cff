//! Request and response models for the resource cache
//!
//! Transport-neutral descriptions of outgoing requests, received responses
//! and deferred writes.

pub mod action;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use action::PendingAction;
pub use request::{Method, Request, RequestMode};
pub use response::Response;
