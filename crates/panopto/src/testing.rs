//! Scripted fakes for the transport and token-provider seams.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tokio::sync::Mutex;

use crate::api::ApiSession;
use crate::auth::{AuthSession, TokenProvider};
use crate::error::{ClientError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub(crate) const TEST_SERVER: &str = "https://demo.hosted.panopto.com";

/// Hands out `token-0`, `token-1`, ... and counts acquisitions.
pub(crate) struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingProvider {
    async fn acquire_token(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("token-{n}"))
    }
}

pub(crate) struct FailingProvider;

#[async_trait]
impl TokenProvider for FailingProvider {
    async fn acquire_token(&self) -> Result<String> {
        Err(ClientError::Auth("provider rejected the request".into()))
    }
}

/// Replays a fixed sequence of responses in request order and records
/// every request it saw.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<ApiResponse>>,
    pub requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<ApiResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().await.push(request);
        Ok(self
            .script
            .lock()
            .await
            .pop_front()
            .expect("transport script exhausted"))
    }
}

/// Routes by URL substring instead of arrival order, for exercising
/// concurrent enrichment where request order is not deterministic.
pub(crate) struct RoutedTransport {
    routes: Vec<(String, ApiResponse)>,
    pub requests: Mutex<Vec<ApiRequest>>,
}

impl RoutedTransport {
    pub fn new(routes: Vec<(&str, ApiResponse)>) -> Arc<Self> {
        Arc::new(Self {
            routes: routes
                .into_iter()
                .map(|(fragment, response)| (fragment.to_string(), response))
                .collect(),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for RoutedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = request.url.clone();
        self.requests.lock().await.push(request);
        match self
            .routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
        {
            Some((_, response)) => Ok(response.clone()),
            None => panic!("no route for {url}"),
        }
    }
}

pub(crate) fn response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status: StatusCode::from_u16(status).expect("valid status code"),
        body: Bytes::copy_from_slice(body.as_bytes()),
    }
}

/// A session-listing page body holding one minimal record per id.
pub(crate) fn page_body(ids: &[&str]) -> String {
    let results: Vec<String> = ids
        .iter()
        .map(|id| format!(r#"{{"Id":"{id}","Name":"session {id}","Duration":61.0}}"#))
        .collect();
    format!(r#"{{"Results":[{}]}}"#, results.join(","))
}

/// A folder-children page body holding one child per (id, name) pair.
pub(crate) fn folder_body(children: &[(&str, &str)]) -> String {
    let results: Vec<String> = children
        .iter()
        .map(|(id, name)| format!(r#"{{"Id":"{id}","Name":"{name}"}}"#))
        .collect();
    format!(r#"{{"Results":[{}]}}"#, results.join(","))
}

pub(crate) fn session_with(
    script: Vec<ApiResponse>,
) -> (Arc<ApiSession>, Arc<ScriptedTransport>, Arc<CountingProvider>) {
    let transport = ScriptedTransport::new(script);
    let provider = CountingProvider::new();
    let auth = AuthSession::new(provider.clone());
    let api = Arc::new(ApiSession::new(TEST_SERVER, auth, transport.clone()));
    (api, transport, provider)
}

pub(crate) fn session_routed(
    routes: Vec<(&str, ApiResponse)>,
) -> (Arc<ApiSession>, Arc<RoutedTransport>) {
    let transport = RoutedTransport::new(routes);
    let provider = CountingProvider::new();
    let auth = AuthSession::new(provider);
    let api = Arc::new(ApiSession::new(TEST_SERVER, auth, transport.clone()));
    (api, transport)
}
