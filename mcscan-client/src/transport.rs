//! Transport seam
//!
//! [`crate::ResilientClient`] owns timeouts, retries and classification;
//! a [`Transport`] only moves one request over the wire and hands back the
//! raw status and body.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};

/// A single request to the backend, relative to the transport's base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path starting with `/`, e.g. `/scan/status/abc`
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body,
        }
    }
}

/// Status and body of a response, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Moves one request over the wire
///
/// Implementations report connection failures as [`ClientError::Network`]
/// and their own timeouts as [`ClientError::Timeout`]; any HTTP status,
/// including errors, is a successful [`RawResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest, timeout: Duration) -> Result<RawResponse>;
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    /// Base URL of the backend API (e.g., "http://localhost:18000/api/v1")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport for the given base URL
    ///
    /// # Example
    /// ```
    /// use mcscan_client::ReqwestTransport;
    ///
    /// let transport = ReqwestTransport::new("http://localhost:18000/api/v1/");
    /// assert_eq!(transport.base_url(), "http://localhost:18000/api/v1");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a transport with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_error(error: reqwest::Error, timeout: Duration) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout { timeout }
        } else if error.is_connect() || error.is_request() || error.is_body() {
            ClientError::Network(error.to_string())
        } else {
            ClientError::Unknown(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest, timeout: Duration) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .timeout(timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_trims_trailing_slash() {
        let transport = ReqwestTransport::new("http://localhost:18000/api/v1/");
        assert_eq!(transport.base_url(), "http://localhost:18000/api/v1");
    }

    #[test]
    fn test_transport_with_custom_client() {
        let transport = ReqwestTransport::with_client("http://localhost:18000", Client::new());
        assert_eq!(transport.base_url(), "http://localhost:18000");
    }

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::get("/scan/active");
        assert_eq!(request.method, Method::GET);
        assert!(request.body.is_none());

        let request = ApiRequest::post("/scan/cancel/x", None);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/scan/cancel/x");
    }
}
