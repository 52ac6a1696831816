//! Three-phase protocol for a single file.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chunkup_protocol::{
    AbortRequest, CompleteRequest, CompletedPart, InitiateRequest, InitiateResponse, PartResponse,
    Phase, SessionRef,
};
use chunkup_transfer::{PartPlan, SpeedCalculator, UploadFile};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::UploadError;
use crate::table::TaskTable;
use crate::transport::{ResponseNormalizer, UploadTransport, cancellable, decode};
use crate::types::{UploadEvent, UploadTask};

/// Drives one task from `uploading` to `completed`.
///
/// The caller has already moved the task to `uploading`. Any error is
/// returned untouched; the batch loop decides whether it becomes `error` or
/// `aborted`.
pub(crate) struct FileUpload<'a> {
    pub transport: &'a dyn UploadTransport,
    pub normalizer: Option<&'a ResponseNormalizer>,
    pub tasks: &'a Mutex<TaskTable>,
    pub events: &'a UnboundedSender<UploadEvent>,
    pub cancel: CancellationToken,
    pub chunk_size: u64,
    pub folder: Option<String>,
}

impl FileUpload<'_> {
    /// Runs initiate, every part in order, then complete.
    pub async fn run(&self, task_id: &str) -> Result<UploadTask, UploadError> {
        let file = self
            .table()
            .get(task_id)
            .map(|t| t.file.clone())
            .ok_or_else(|| UploadError::TaskNotFound(task_id.to_string()))?;

        self.check_cancelled()?;
        let session = self.initiate(&file).await?;
        if !self.table().attach_session(task_id, session.clone()) {
            // Aborted while initiate was answering; the abort path never saw
            // this session.
            self.discard_session(task_id, &session).await;
            return Err(UploadError::Cancelled);
        }
        debug!(task = %task_id, upload_id = %session.upload_id, key = %session.key, "session started");

        let parts = self.upload_parts(task_id, &file, &session).await?;

        self.check_cancelled()?;
        let req = CompleteRequest::new(&session, parts);
        let raw = cancellable(&self.cancel, self.transport.complete(&req)).await?;
        let response: Value = decode(Phase::Complete, raw, self.normalizer)?;

        let task = self
            .table()
            .complete(task_id)
            .ok_or(UploadError::Cancelled)?;
        let _ = self.events.send(UploadEvent::FileComplete {
            task: task.clone(),
            response,
        });
        Ok(task)
    }

    async fn initiate(&self, file: &UploadFile) -> Result<SessionRef, UploadError> {
        let req = InitiateRequest {
            file_name: file.name.clone(),
            file_type: file.mime_type.clone(),
            folder: self.folder.clone(),
        };
        let raw = cancellable(&self.cancel, self.transport.initiate(&req)).await?;
        let resp: InitiateResponse = decode(Phase::Initiate, raw, self.normalizer)?;
        if resp.upload_id.is_empty() || resp.key.is_empty() {
            return Err(UploadError::InvalidResponse {
                phase: Phase::Initiate,
                reason: "empty uploadId or key".into(),
            });
        }
        Ok(resp.into())
    }

    /// Best-effort `abort` for a session the task table no longer accepts.
    async fn discard_session(&self, task_id: &str, session: &SessionRef) {
        let req = AbortRequest::from(session);
        match self.transport.abort(&req).await {
            Ok(()) => debug!(task = %task_id, upload_id = %session.upload_id, "late session discarded"),
            Err(e) => {
                warn!(task = %task_id, upload_id = %session.upload_id, error = %e, "abort cleanup failed");
            }
        }
    }

    /// Uploads every part strictly in order, one request in flight.
    async fn upload_parts(
        &self,
        task_id: &str,
        file: &UploadFile,
        session: &SessionRef,
    ) -> Result<Vec<CompletedPart>, UploadError> {
        let plan = PartPlan::new(file.size, self.chunk_size);
        let mut parts = Vec::with_capacity(plan.total_parts() as usize);
        let mut speed = SpeedCalculator::default();
        speed.add_sample(0);

        for range in plan.parts() {
            self.check_cancelled()?;

            let part_number = range.part_number;
            let data = file.read_range_async(range.start, range.end).await?;

            let raw = cancellable(
                &self.cancel,
                self.transport.upload_part(session, part_number, data),
            )
            .await
            .map_err(|e| part_error(part_number, e))?;
            let ack: PartResponse =
                decode(Phase::Part, raw, self.normalizer).map_err(|e| part_error(part_number, e))?;

            parts.push(CompletedPart {
                part_number,
                etag: ack.etag,
            });
            speed.add_sample(range.len());

            let (uploaded_bytes, progress) = {
                let mut table = self.table();
                if !table.advance(task_id, range.end) {
                    return Err(UploadError::Cancelled);
                }
                let task = table
                    .get(task_id)
                    .ok_or_else(|| UploadError::TaskNotFound(task_id.to_string()))?;
                (task.uploaded_bytes, task.progress)
            };
            debug!(
                task = %task_id,
                part = part_number,
                total = plan.total_parts(),
                uploaded_bytes,
                "part uploaded"
            );
            let _ = self.events.send(UploadEvent::Progress {
                task_id: task_id.to_string(),
                uploaded_bytes,
                progress,
                bytes_per_second: speed.bytes_per_second(),
                eta: speed.eta(file.size.saturating_sub(uploaded_bytes)),
            });
        }

        Ok(parts)
    }

    fn table(&self) -> MutexGuard<'_, TaskTable> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Names the failing part, keeping cancellation distinguishable.
fn part_error(part_number: u32, err: UploadError) -> UploadError {
    match err {
        UploadError::Cancelled => UploadError::Cancelled,
        other => UploadError::PartFailed {
            part_number,
            reason: other.to_string(),
        },
    }
}
