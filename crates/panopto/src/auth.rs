//! Bearer credential management.
//!
//! The credential has no locally tracked expiry; validity is discovered
//! reactively when a request comes back `401`. Renewal is therefore
//! always caller-triggered, and must stay idempotent when several
//! concurrent requests observe the same rejection.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Produces a bearer credential on demand. Opaque to the rest of the
/// client; acquisition failure is unrecoverable at this layer.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire_token(&self) -> Result<String>;
}

/// OAuth2 client-credentials provider against the server token endpoint.
pub struct ClientCredentialsProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    client: reqwest::Client,
}

impl ClientCredentialsProvider {
    pub fn new(
        server_base: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token_url: format!(
                "{}/Panopto/oauth2/connect/token",
                server_base.trim_end_matches('/')
            ),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client,
        }
    }
}

impl std::fmt::Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn acquire_token(&self) -> Result<String> {
        let credentials = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .client
            .post(&self.token_url)
            .header(AUTHORIZATION, format!("Basic {credentials}"))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ClientError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Auth(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::Auth(e.to_string()))?;

        body.get("access_token")
            .and_then(|t| t.as_str())
            .map(str::to_owned)
            .ok_or_else(|| ClientError::Auth("no access_token in token response".to_string()))
    }
}

#[derive(Default)]
struct CredentialState {
    token: Option<String>,
    /// Bumped on every successful acquisition. A renewal request names
    /// the generation the caller observed, so concurrent 401s collapse
    /// into a single provider call.
    generation: u64,
}

/// Owns the current bearer credential and attaches it to requests.
///
/// The provider is only called when no credential is held, or when a
/// caller forces renewal after observing a `401`.
pub struct AuthSession {
    provider: Arc<dyn TokenProvider>,
    state: Mutex<CredentialState>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(CredentialState::default()),
        }
    }

    /// The held credential and its generation, acquiring one lazily if
    /// none is held.
    pub async fn credential(&self) -> Result<(String, u64)> {
        let mut state = self.state.lock().await;
        if let Some(token) = &state.token {
            return Ok((token.clone(), state.generation));
        }

        debug!("no credential held, acquiring");
        let token = self.provider.acquire_token().await?;
        state.token = Some(token.clone());
        state.generation += 1;
        Ok((token, state.generation))
    }

    /// Request headers for an authenticated call, plus the credential
    /// generation to report back on a `401`.
    pub async fn headers(&self) -> Result<(HeaderMap, u64)> {
        let (token, generation) = self.credential().await?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::Auth("credential is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok((headers, generation))
    }

    /// Discard the held credential and immediately re-acquire one.
    ///
    /// Idempotent per generation: if the held generation has already
    /// moved past `observed`, another caller renewed first and this
    /// call is a no-op.
    pub async fn force_renew(&self, observed: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.generation != observed {
            debug!(
                observed,
                held = state.generation,
                "credential already renewed"
            );
            return Ok(());
        }

        state.token = None;
        info!("renewing bearer credential");
        let token = self.provider.acquire_token().await?;
        state.token = Some(token);
        state.generation += 1;
        Ok(())
    }
}
