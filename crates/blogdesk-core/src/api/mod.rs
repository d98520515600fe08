//! REST API client module for the blog backend.
//!
//! This module provides the `ApiClient` and the interceptor `Pipeline` that
//! wraps every call it makes. The standard pipeline attaches the persisted
//! bearer token on the way out and performs a forced logout when the backend
//! answers 401.

pub mod client;
pub mod error;
pub mod pipeline;

pub use client::ApiClient;
pub use error::ApiError;
pub use pipeline::{
    ApiResponse, BearerAuthStage, OutboundRequest, Pipeline, RequestStage, ResponseStage,
    TraceStage, UnauthorizedStage,
};
