//! Backend client
//!
//! [`HttpClient`] owns the base URL and default headers; [`FaultClient`]
//! maps the fault-management endpoints onto the [`FaultApi`] trait.

mod api;
mod http;

pub use api::{FaultApi, FaultClient};
pub use http::HttpClient;
