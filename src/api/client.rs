//! Backend API Client
//!
//! HTTP client shared by page units. Every request path is joined onto the
//! process-wide base path (`/api` by default), which is fixed when the client
//! is built.

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration for the backend API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Origin the dashboard is served from (e.g., "http://localhost:3000")
    pub origin: String,
    /// Path prefix for every backend call
    pub base_path: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            base_path: "/api".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Backend API client with a fixed base path
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiClientConfig) -> Result<Self, ApiClientError> {
        if !config.origin.starts_with("http://") && !config.origin.starts_with("https://") {
            return Err(ApiClientError::InvalidConfig(format!(
                "origin must be an http(s) URL: {}",
                config.origin
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let base_path = config.base_path.trim_matches('/');
        let origin = config.origin.trim_end_matches('/');
        let base_url = if base_path.is_empty() {
            origin.to_string()
        } else {
            format!("{}/{}", origin, base_path)
        };

        Ok(Self { client, base_url })
    }

    /// Origin plus base path, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a backend path
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiClientError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiClientError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "DELETE");
        let response = self.client.delete(&url).send().await?;
        Self::check(response).await.map(|_| ())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiClientError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiClientError::Decode(e.to_string()))
    }
}

/// Errors from backend calls
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("Invalid API client configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}
