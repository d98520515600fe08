//! Ordered interceptor stages wrapped around every API call.
//!
//! Request stages run in registration order before a call is sent and may
//! modify the outgoing request or reject it. Response stages run in
//! registration order after every response *or* failure and may pass the
//! result through, transform it, or replace it.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ApiError;
use crate::navigation::Navigator;
use crate::storage::{KeyValueStore, TOKEN_KEY};

// ============================================================================
// Envelopes
// ============================================================================

/// A request as seen by the request stages, before it is handed to reqwest.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the client's base URL, starting with `/`
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The bearer credential attached to this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// A successful (2xx) response with its body already read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("{} (status {})", e, self.status)))
    }
}

// ============================================================================
// Stage contracts
// ============================================================================

pub trait RequestStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect or modify the outgoing request. An error rejects the call.
    fn prepare(&self, request: &mut OutboundRequest) -> Result<(), ApiError>;
}

pub trait ResponseStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Observe the outcome of a call and return the result to pass on.
    fn inspect(
        &self,
        request: &OutboundRequest,
        result: Result<ApiResponse, ApiError>,
    ) -> Result<ApiResponse, ApiError>;
}

#[derive(Clone, Default)]
pub struct Pipeline {
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

impl Pipeline {
    /// An empty pipeline: requests go out untouched, results come back untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stages every authenticated client runs:
    /// trace → bearer-auth on the way out, unauthorized → trace on the way in.
    pub fn standard(
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        let trace = Arc::new(TraceStage);
        Self::new()
            .with_request_stage(trace.clone())
            .with_request_stage(Arc::new(BearerAuthStage::new(storage.clone())))
            .with_response_stage(Arc::new(UnauthorizedStage::new(
                storage, navigator, login_path,
            )))
            .with_response_stage(trace)
    }

    pub fn with_request_stage(mut self, stage: Arc<dyn RequestStage>) -> Self {
        self.request_stages.push(stage);
        self
    }

    pub fn with_response_stage(mut self, stage: Arc<dyn ResponseStage>) -> Self {
        self.response_stages.push(stage);
        self
    }

    pub fn request_stage_names(&self) -> Vec<&'static str> {
        self.request_stages.iter().map(|s| s.name()).collect()
    }

    pub fn response_stage_names(&self) -> Vec<&'static str> {
        self.response_stages.iter().map(|s| s.name()).collect()
    }

    /// Run request stages in order, stopping at the first rejection.
    pub fn prepare(&self, request: &mut OutboundRequest) -> Result<(), ApiError> {
        for stage in &self.request_stages {
            stage.prepare(request)?;
        }
        Ok(())
    }

    /// Thread the result through every response stage in order.
    pub fn inspect(
        &self,
        request: &OutboundRequest,
        result: Result<ApiResponse, ApiError>,
    ) -> Result<ApiResponse, ApiError> {
        self.response_stages
            .iter()
            .fold(result, |result, stage| stage.inspect(request, result))
    }
}

// ============================================================================
// Standard stages
// ============================================================================

/// Attaches the persisted token as a bearer credential.
///
/// Reads storage on every call, so a token cleared by another stage (or
/// another process) stops being sent immediately.
pub struct BearerAuthStage {
    storage: Arc<dyn KeyValueStore>,
}

impl BearerAuthStage {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }
}

impl RequestStage for BearerAuthStage {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn prepare(&self, request: &mut OutboundRequest) -> Result<(), ApiError> {
        let token = match self.storage.get(TOKEN_KEY)? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(()),
        };
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidRequest("stored token is not a valid header value".into()))?;
        request.headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }
}

/// Forced logout on 401.
///
/// Removes the persisted token and redirects to the login path, then hands
/// the original error on. The session store's in-memory state is left alone,
/// so `is_authenticated` can stay true until the next explicit logout or
/// restart.
pub struct UnauthorizedStage {
    storage: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl UnauthorizedStage {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            navigator,
            login_path: login_path.into(),
        }
    }
}

impl ResponseStage for UnauthorizedStage {
    fn name(&self) -> &'static str {
        "unauthorized"
    }

    fn inspect(
        &self,
        request: &OutboundRequest,
        result: Result<ApiResponse, ApiError>,
    ) -> Result<ApiResponse, ApiError> {
        let err = match result {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if err.is_unauthorized() {
            warn!(method = %request.method, path = %request.path, "Credential rejected, clearing stored token");
            // The redirect still happens if storage fails; the caller gets
            // the original 401 either way.
            if let Err(e) = self.storage.remove(TOKEN_KEY) {
                warn!(error = %e, "Failed to clear stored token");
            }
            self.navigator.redirect(&self.login_path);
        }

        Err(err)
    }
}

/// Debug-level logging of traffic. Never changes anything.
pub struct TraceStage;

impl RequestStage for TraceStage {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn prepare(&self, request: &mut OutboundRequest) -> Result<(), ApiError> {
        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = request.bearer_token().is_some(),
            "Sending request"
        );
        Ok(())
    }
}

impl ResponseStage for TraceStage {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn inspect(
        &self,
        request: &OutboundRequest,
        result: Result<ApiResponse, ApiError>,
    ) -> Result<ApiResponse, ApiError> {
        match &result {
            Ok(response) => {
                debug!(method = %request.method, path = %request.path, status = %response.status, "Request succeeded")
            }
            Err(e) => {
                debug!(method = %request.method, path = %request.path, status = ?e.status(), error = %e, "Request failed")
            }
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
