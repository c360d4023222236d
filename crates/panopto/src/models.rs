use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recording ("session") as returned by the listing endpoint.
///
/// `id` is the only field the API guarantees; it is unique within one
/// fetched result set but not across listings, and the client never
/// deduplicates. Every other field may be absent upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    /// Length in seconds.
    #[serde(rename = "Duration", default)]
    pub duration: Option<f64>,
    #[serde(rename = "CreatedDate", default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(rename = "ParentFolderId", default)]
    pub parent_folder_id: Option<String>,
    #[serde(rename = "ViewerCount", default)]
    pub viewer_count: Option<u64>,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    /// Viewer entries attached by enrichment. Opaque payload, passed
    /// through unmodified; an empty list records a failed fetch.
    #[serde(rename = "ViewerDetails", default)]
    pub viewer_details: Option<Vec<serde_json::Value>>,
}

/// Envelope of the session listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPage {
    #[serde(rename = "Results", default)]
    pub results: Vec<Session>,
}

/// One child of a folder, from the folder-children endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// Envelope of the folder-children endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderPage {
    #[serde(rename = "Results", default)]
    pub results: Vec<Folder>,
}

/// Viewer page URL for a session. Always derived from the id, never
/// stored alongside it.
pub fn viewer_url(server_base: &str, id: &str) -> String {
    format!(
        "{}/Panopto/Pages/Viewer.aspx?id={}",
        server_base.trim_end_matches('/'),
        id
    )
}
