//! HTTP request execution for barrage
//!
//! This crate provides the request-execution seam used by the stress-test
//! engine: the [`RequestExecutor`] trait, a reqwest-backed [`HttpManager`]
//! with offline mock support, and loading of already-resolved request files.

pub mod client;
pub mod config;
pub mod errors;
pub mod request;
pub mod template;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpManager, MockResponse, RequestExecutor};
pub use config::HttpConfig;
pub use errors::{HttpError, HttpResult};
pub use request::{HttpResponse, ResolvedRequest};
pub use template::{load_request_file, RequestTemplate};
pub use types::{HttpMethod, HttpMethodError};
