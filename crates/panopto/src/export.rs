//! CSV projection of collected sessions.
//!
//! Serialization is a pure function of its inputs: the same sessions
//! and columns produce byte-identical output on every call.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{ClientError, Result};
use crate::models::{Session, viewer_url};

/// Columns the serializer can project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Id,
    Duration,
    Created,
    Folder,
    Views,
    Status,
    Url,
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Name => "Name",
            Column::Id => "ID",
            Column::Duration => "Duration",
            Column::Created => "Created",
            Column::Folder => "Folder",
            Column::Views => "Views",
            Column::Status => "Status",
            Column::Url => "URL",
        }
    }
}

/// The compact projection.
pub const BASIC_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Id,
    Column::Duration,
    Column::Folder,
    Column::Url,
];

/// The projection with creation date, view count and state included.
pub const FULL_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Id,
    Column::Duration,
    Column::Created,
    Column::Folder,
    Column::Views,
    Column::Status,
    Column::Url,
];

/// Format a duration in seconds as `HH:MM:SS`. Hours are unbounded;
/// minutes and seconds stay within `[0, 59]`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

fn field(session: &Session, column: Column, server_base: &str) -> Result<String> {
    let value = match column {
        Column::Name => session
            .name
            .clone()
            .ok_or_else(|| missing(column, &session.id))?,
        Column::Id => session.id.clone(),
        Column::Duration => format_duration(session.duration.unwrap_or(0.0)),
        Column::Created => session
            .created_date
            .ok_or_else(|| missing(column, &session.id))?
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        Column::Folder => session.parent_folder_id.clone().unwrap_or_default(),
        Column::Views => session.viewer_count.unwrap_or(0).to_string(),
        Column::Status => session.state.clone().unwrap_or_default(),
        Column::Url => viewer_url(server_base, &session.id),
    };
    Ok(value)
}

fn missing(column: Column, id: &str) -> ClientError {
    ClientError::Schema(format!(
        "session {id} has no value for required column {}",
        column.header()
    ))
}

/// Serialize sessions into CSV bytes, header row first.
///
/// `Name` and `Created` must be present on every session when their
/// columns are requested; `Duration`, `Folder`, `Views` and `Status`
/// fall back to `00:00:00`, empty, `0` and empty respectively. The
/// result is all-or-nothing: any schema failure discards the buffer.
pub fn to_csv(sessions: &[Session], columns: &[Column], server_base: &str) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.header()))?;

    for session in sessions {
        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            row.push(field(session, *column, server_base)?);
        }
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ClientError::Io(std::io::Error::other(e.to_string())))
}

/// Write bytes to `path` atomically: stage in a temp file in the same
/// directory, then rename over the destination. A failed run leaves
/// any existing file untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.persist(path).map_err(|e| ClientError::Io(e.error))?;

    debug!(path = %path.display(), "export written");
    Ok(())
}
