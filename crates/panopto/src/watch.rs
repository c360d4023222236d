//! Long-running folder poll loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::ApiSession;
use crate::error::Result;
use crate::models::{Folder, FolderPage};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Repeatedly lists a folder's children on a fixed interval,
/// re-authenticating transparently when the credential expires.
///
/// The loop never ends on its own in the success path; it stops only
/// on a fatal error or when the cancellation token fires.
pub struct FolderWatcher {
    api: Arc<ApiSession>,
    folder_id: String,
    interval: Duration,
    cancellation: CancellationToken,
}

impl FolderWatcher {
    pub fn new(
        api: Arc<ApiSession>,
        folder_id: impl Into<String>,
        interval: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            api,
            folder_id: folder_id.into(),
            interval,
            cancellation,
        }
    }

    /// Drive the poll loop, delivering each successful listing on
    /// `sink`.
    ///
    /// A `401` renews the credential and re-issues the same request
    /// immediately, without consuming a poll interval; the request
    /// layer escalates a second consecutive `401`. Any other non-2xx
    /// and any transport failure ends the loop. Cancellation is
    /// observed at the top of each iteration and during the sleep, and
    /// returns `Ok`.
    pub async fn run(&self, sink: mpsc::Sender<Vec<Folder>>) -> Result<()> {
        // Acquire the initial credential up front; failing here is the
        // one unrecoverable transition of the loop's state machine.
        self.api.authenticate().await?;
        info!(
            folder = %self.folder_id,
            interval_secs = self.interval.as_secs(),
            "watching folder children"
        );

        let path = format!("folders/{}/children", self.folder_id);
        loop {
            if self.cancellation.is_cancelled() {
                info!("folder watch cancelled");
                return Ok(());
            }

            let page: FolderPage = self.api.get_json(&path, &[]).await?;
            debug!(count = page.results.len(), "folder children listed");

            if sink.send(page.results).await.is_err() {
                // Receiver dropped; nobody is listening anymore.
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    info!("folder watch cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
