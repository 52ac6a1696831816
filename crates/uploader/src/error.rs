//! Upload error types.

use chunkup_protocol::Phase;

/// Errors produced by the upload client.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {phase} response: {reason}")]
    InvalidResponse { phase: Phase, reason: String },

    #[error("Failed to upload part {part_number}: {reason}")]
    PartFailed { part_number: u32, reason: String },

    #[error("transfer error: {0}")]
    Transfer(#[from] chunkup_transfer::TransferError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Sentinel for user-requested cancellation. Never recorded as a task
    /// error.
    #[error("Upload aborted by user")]
    Cancelled,
}

impl UploadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
