//! Authenticated HTTP transport.
//!
//! This module provides a `Transport` trait for talking to the job service.
//! Requests with a body are signed; bodiless requests go out unsigned.
//! Retry policy is left to callers.

mod http;
mod traits;
mod types;

pub use http::HttpTransport;
pub(crate) use http::network_cause;
pub use traits::*;
pub use types::*;
