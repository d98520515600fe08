//! API client for the blog backend.
//!
//! Every call, typed or generic, goes through [`ApiClient::execute`], which
//! runs the client's [`Pipeline`] around the actual HTTP exchange.

use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::pipeline::{ApiResponse, OutboundRequest, Pipeline};
use super::ApiError;
use crate::config::Config;
use crate::models::{ProfileUpdate, RegistrationStatus, UserProfile};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

/// API client for the blog backend.
/// Clone is cheap - reqwest::Client and the pipeline stages are behind Arcs.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    pipeline: Pipeline,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, pipeline: Pipeline) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pipeline,
        })
    }

    pub fn from_config(config: &Config, pipeline: Pipeline) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.timeout(), pipeline)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Run a request through the pipeline.
    ///
    /// Response stages see every outcome, including a request rejected by a
    /// request stage and transport failures.
    pub async fn execute(&self, mut request: OutboundRequest) -> Result<ApiResponse, ApiError> {
        let result = match self.pipeline.prepare(&mut request) {
            Ok(()) => self.dispatch(&request).await,
            Err(e) => Err(e),
        };
        self.pipeline.inspect(&request, result)
    }

    async fn dispatch(&self, request: &OutboundRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .header(header::ACCEPT, "application/json")
            .headers(request.headers.clone());
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status.is_success() {
            Ok(ApiResponse { status, headers, body })
        } else {
            Err(ApiError::from_status(status, &body))
        }
    }

    fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode request body: {}", e)))
    }

    // ===== Generic JSON helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(OutboundRequest::new(Method::GET, path)).await?.json()
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = OutboundRequest::new(Method::POST, path).with_json(Self::encode(body)?);
        self.execute(request).await?.json()
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = OutboundRequest::new(Method::PUT, path).with_json(Self::encode(body)?);
        self.execute(request).await?.json()
    }

    /// DELETE ignores the response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(OutboundRequest::new(Method::DELETE, path)).await?;
        Ok(())
    }

    // ===== Auth & profile endpoints =====

    /// Exchange credentials for a bearer token
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let auth: AuthResponse = self
            .post("/auth/login", &LoginRequest { username, password })
            .await?;
        if auth.token.is_empty() {
            return Err(ApiError::InvalidResponse("login response carried an empty token".into()));
        }
        Ok(auth.token)
    }

    /// Create the author account. Only allowed while no account exists.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .post("/auth/register", &RegisterRequest { username, email, password })
            .await?;
        Ok(response.message)
    }

    pub async fn registration_status(&self) -> Result<RegistrationStatus, ApiError> {
        self.get("/registration-status").await
    }

    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/user/profile").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.put("/user/profile", update).await
    }
}

// ============================================================================
// Tests
// ============================================================================
