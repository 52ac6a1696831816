//! Data types shared by the upload client and its host.

use std::time::Duration;

use chunkup_protocol::{SessionRef, UploadStatus};
use chunkup_transfer::{UploadFile, progress_percent};

/// One file queued for upload.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub id: String,
    pub file: UploadFile,
    pub status: UploadStatus,
    /// Percentage in `0.0..=100.0`, derived from `uploaded_bytes`.
    pub progress: f64,
    /// Bytes confirmed by successful part responses.
    pub uploaded_bytes: u64,
    /// `data:` URL thumbnail, images only, filled in asynchronously.
    pub preview: Option<String>,
    /// Failure reason for `error`, fixed reason for `aborted`.
    pub error: Option<String>,
    /// Set once `initiate` succeeds.
    pub session: Option<SessionRef>,
}

impl UploadTask {
    /// Creates a pending task.
    pub fn new(id: String, file: UploadFile) -> Self {
        Self {
            id,
            file,
            status: UploadStatus::Pending,
            progress: 0.0,
            uploaded_bytes: 0,
            preview: None,
            error: None,
            session: None,
        }
    }

    pub fn upload_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.upload_id.as_str())
    }

    pub fn key(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.key.as_str())
    }

    /// Sets `uploaded_bytes` and recomputes `progress` from it.
    pub(crate) fn set_uploaded(&mut self, bytes: u64) {
        self.uploaded_bytes = bytes;
        self.progress = progress_percent(bytes, self.file.size);
    }
}

/// Event emitted to the host.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A part of `task_id` was acknowledged.
    Progress {
        task_id: String,
        uploaded_bytes: u64,
        progress: f64,
        bytes_per_second: f64,
        /// Time left for this file at the current speed; `None` until a
        /// speed is known.
        eta: Option<Duration>,
    },
    /// A file finished all three phases.
    FileComplete {
        task: UploadTask,
        /// Server payload of `complete`, after normalization.
        response: serde_json::Value,
    },
    /// A batch finished, whatever the per-file outcomes.
    UploadComplete { tasks: Vec<UploadTask> },
    /// The user aborted; lists every task that was stopped.
    UploadAborted { tasks: Vec<UploadTask> },
}
