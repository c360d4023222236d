use thiserror::Error;

/// Error taxonomy for the client.
///
/// Only a `401` on a primary request is ever recovered automatically
/// (one forced credential renewal, one retry). Everything else here is
/// fatal to the operation that produced it, with the single exception
/// of viewer enrichment, which downgrades any of these to an empty
/// result.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("auth error: {0}")]
    Auth(String),
    #[error("api error (status={status}): {body}")]
    Api { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ClientError>;
