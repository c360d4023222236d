//! Paginated session collection with best-effort viewer enrichment.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiSession;
use crate::error::{ClientError, Result};
use crate::models::{Session, SessionPage};

pub const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_ENRICH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub page_size: usize,
    /// Fetch viewer details for every collected session.
    pub enrich: bool,
    /// Bounded worker count for enrichment fetches. Results merge back
    /// in record order regardless of completion order.
    pub enrich_concurrency: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            enrich: false,
            enrich_concurrency: DEFAULT_ENRICH_CONCURRENCY,
        }
    }
}

/// Drives page requests against the session listing endpoint and
/// accumulates the result eagerly in memory.
pub struct SessionCollector {
    api: Arc<ApiSession>,
    config: CollectorConfig,
    cancellation: CancellationToken,
}

impl SessionCollector {
    pub fn new(
        api: Arc<ApiSession>,
        config: CollectorConfig,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            api,
            config,
            cancellation,
        }
    }

    /// Collect every session in the folder, newest first.
    ///
    /// Termination: an empty page, or a page shorter than the page
    /// size. A final page of exactly the page size costs one trailing
    /// empty-page request; that round trip is part of the contract.
    /// Page order and within-page order are preserved as returned.
    pub async fn collect(&self, folder_id: &str) -> Result<Vec<Session>> {
        let mut accumulated = Vec::new();
        let mut page_number: usize = 0;

        loop {
            if self.cancellation.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let page = self.fetch_page(folder_id, page_number).await?;
            let count = page.results.len();
            debug!(page = page_number, count, "fetched session page");

            if count == 0 {
                break;
            }

            let sessions = if self.config.enrich {
                self.enrich_page(page.results).await
            } else {
                page.results
            };
            accumulated.extend(sessions);

            if count < self.config.page_size {
                break;
            }
            page_number += 1;
        }

        info!(
            folder = folder_id,
            total = accumulated.len(),
            "session collection finished"
        );
        Ok(accumulated)
    }

    async fn fetch_page(&self, folder_id: &str, page_number: usize) -> Result<SessionPage> {
        self.api
            .get_json(
                &format!("folders/{folder_id}/sessions"),
                &[
                    ("sortField", "CreatedDate".to_string()),
                    ("sortOrder", "Desc".to_string()),
                    ("pageNumber", page_number.to_string()),
                    ("pageSize", self.config.page_size.to_string()),
                ],
            )
            .await
    }

    /// Attach viewer details to every session in the page. The buffered
    /// stream yields in submission order, so the page keeps its shape
    /// even when fetches complete out of order.
    async fn enrich_page(&self, sessions: Vec<Session>) -> Vec<Session> {
        stream::iter(sessions)
            .map(|mut session| {
                let api = self.api.clone();
                async move {
                    session.viewer_details = Some(fetch_viewers(&api, &session.id).await);
                    session
                }
            })
            .buffered(self.config.enrich_concurrency.max(1))
            .collect()
            .await
    }
}

/// Best-effort per-session viewer fetch. Every failure path degrades to
/// an empty list; losing one viewer list must never cost the rest of
/// the page.
async fn fetch_viewers(api: &ApiSession, id: &str) -> Vec<serde_json::Value> {
    match api.get_json(&format!("sessions/{id}/viewers"), &[]).await {
        Ok(viewers) => viewers,
        Err(e) => {
            warn!(session = id, error = %e, "viewer enrichment failed, continuing without details");
            Vec::new()
        }
    }
}
