//! The request/response exchange boundary.
//!
//! Everything above this trait deals in [`ApiRequest`]/[`ApiResponse`]
//! pairs; the reqwest-backed implementation is the only place that
//! talks to the network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;

use crate::error::Result;

/// Every network call carries an explicit timeout; one that exceeds it
/// surfaces as a transport failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single exchange against the remote API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// HTTP client with the platform certificate verifier and an explicit
/// request timeout.
pub fn default_client(timeout: Duration) -> Client {
    let provider = Arc::new(ring::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("Failed to configure default TLS protocol versions")
        .with_platform_verifier()
        .unwrap()
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: default_client(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .query(&request.query)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        Ok(ApiResponse { status, body })
    }
}
