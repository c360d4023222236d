//! Client for the Panopto REST API.
//!
//! Covers authenticated session handling with reactive credential
//! renewal, paginated session collection with best-effort viewer
//! enrichment, CSV export of the accumulated result, and a
//! folder-children poll loop.

pub mod api;
pub mod auth;
pub mod collector;
pub mod error;
pub mod export;
pub mod models;
pub mod transport;
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use api::ApiSession;
pub use auth::{AuthSession, ClientCredentialsProvider, TokenProvider};
pub use collector::{CollectorConfig, DEFAULT_PAGE_SIZE, SessionCollector};
pub use error::{ClientError, Result};
pub use export::{BASIC_COLUMNS, Column, FULL_COLUMNS, format_duration, to_csv, write_atomic};
pub use models::{Folder, Session, viewer_url};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, default_client};
pub use watch::{DEFAULT_POLL_INTERVAL, FolderWatcher};
