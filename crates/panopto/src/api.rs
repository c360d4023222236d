//! Authenticated request layer over the v1 REST API.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::auth::AuthSession;
use crate::error::{ClientError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Wraps the auth session and transport. Requests carry the held
/// bearer credential; a `401` triggers one forced renewal followed by
/// one retry of the same request, and a second consecutive `401`
/// escalates to an API error. There is no second retry.
pub struct ApiSession {
    transport: Arc<dyn Transport>,
    auth: AuthSession,
    api_base: String,
}

impl ApiSession {
    pub fn new(server_base: &str, auth: AuthSession, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            auth,
            api_base: format!("{}/Panopto/api/v1", server_base.trim_end_matches('/')),
        }
    }

    /// Force the lazy credential acquisition up front. Lets callers
    /// that loop forever fail fast when the provider itself is broken.
    pub async fn authenticate(&self) -> Result<()> {
        self.auth.credential().await.map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Bytes> {
        let url = self.url(path);
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();

        let (headers, generation) = self.auth.headers().await?;
        let response = self
            .transport
            .send(ApiRequest {
                method: Method::GET,
                url: url.clone(),
                query: query.clone(),
                headers,
            })
            .await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return into_body(response);
        }

        // Credential rejected: renew once and retry the same request.
        // If the retry comes back 401 as well, into_body escalates it.
        info!(url = %url, "unauthorized response, renewing credential");
        self.auth.force_renew(generation).await?;

        let (headers, _) = self.auth.headers().await?;
        let response = self
            .transport
            .send(ApiRequest {
                method: Method::GET,
                url,
                query,
                headers,
            })
            .await?;
        into_body(response)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self.get(path, query).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn into_body(response: ApiResponse) -> Result<Bytes> {
    if response.status.is_success() {
        return Ok(response.body);
    }
    Err(ClientError::Api {
        status: response.status.as_u16(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionPage;
    use crate::testing::{page_body, response, session_with};
    use reqwest::header::AUTHORIZATION;

    #[tokio::test]
    async fn unauthorized_then_ok_renews_once_and_retries() {
        let (api, transport, provider) = session_with(vec![
            response(401, ""),
            response(200, &page_body(&["a", "b"])),
        ]);

        let page: SessionPage = api.get_json("folders/f1/sessions", &[]).await.unwrap();

        assert_eq!(page.results.len(), 2);
        // One lazy acquisition plus exactly one renewal.
        assert_eq!(provider.count(), 2);

        let requests = transport.requests.lock().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, requests[1].url);
        assert_eq!(
            requests[1].headers.get(AUTHORIZATION).unwrap(),
            "Bearer token-1"
        );
    }

    #[tokio::test]
    async fn second_consecutive_unauthorized_escalates() {
        let (api, transport, provider) =
            session_with(vec![response(401, ""), response(401, "still expired")]);

        let err = api.get("folders/f1/sessions", &[]).await.unwrap_err();

        assert!(matches!(err, ClientError::Api { status: 401, .. }));
        assert_eq!(provider.count(), 2);
        assert_eq!(transport.request_count().await, 2);
    }

    #[tokio::test]
    async fn non_unauthorized_failure_is_fatal_without_retry() {
        let (api, transport, _) = session_with(vec![response(503, "maintenance")]);

        let err = api.get("folders/f1/sessions", &[]).await.unwrap_err();

        match err {
            ClientError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.request_count().await, 1);
    }

    #[tokio::test]
    async fn unparseable_body_is_a_decode_error() {
        let (api, _, _) = session_with(vec![response(200, "<html>not json</html>")]);

        let err = api
            .get_json::<SessionPage>("folders/f1/sessions", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn paths_join_against_the_api_base() {
        let (api, transport, _) = session_with(vec![response(200, "{}")]);

        api.get("/folders/f1/children", &[]).await.unwrap();

        let requests = transport.requests.lock().await;
        assert_eq!(
            requests[0].url,
            "https://demo.hosted.panopto.com/Panopto/api/v1/folders/f1/children"
        );
    }
}
