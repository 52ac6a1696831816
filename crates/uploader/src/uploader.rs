//! Batch orchestrator and host-facing API.
//!
//! Owns the task table, drives pending files through the three-phase
//! protocol one at a time, and handles user aborts.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chunkup_protocol::{AbortRequest, Phase};
use chunkup_transfer::{UploadFile, ValidationError, validate_file};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::file_upload::FileUpload;
use crate::http::HttpTransport;
use crate::preview::{build_preview, wants_preview};
use crate::table::TaskTable;
use crate::transport::{ResponseNormalizer, UploadTransport};
use crate::types::{UploadEvent, UploadTask};

/// Reason recorded on every task stopped by [`Uploader::abort_upload`].
pub const ABORT_REASON: &str = "Upload aborted by user";

/// Chunked upload client.
///
/// One instance owns one task table. Uploads run strictly one file and one
/// part at a time; a second [`start_upload`](Self::start_upload) waits for
/// the running batch. [`abort_upload`](Self::abort_upload) may be called
/// from another task while a batch is awaiting.
pub struct Uploader {
    transport: Arc<dyn UploadTransport>,
    config: RwLock<UploaderConfig>,
    normalizer: Option<ResponseNormalizer>,
    tasks: Arc<Mutex<TaskTable>>,
    batch_cancel: Mutex<CancellationToken>,
    /// Held for the whole of a batch.
    batch_lock: tokio::sync::Mutex<()>,
    /// Ids pending at the start of the running batch. Lock before `tasks`.
    batch_members: Mutex<HashSet<String>>,
    events_tx: mpsc::UnboundedSender<UploadEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<UploadEvent>>,
}

impl Uploader {
    /// Creates a client that talks HTTP to `config.server_url`.
    pub fn new(config: UploaderConfig) -> Result<Self, UploadError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: UploaderConfig, transport: Arc<dyn UploadTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            config: RwLock::new(config),
            normalizer: None,
            tasks: Arc::new(Mutex::new(TaskTable::new())),
            batch_cancel: Mutex::new(CancellationToken::new()),
            batch_lock: tokio::sync::Mutex::new(()),
            batch_members: Mutex::new(HashSet::new()),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Installs a hook that reshapes raw server responses per phase.
    pub fn with_response_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(Phase, Value) -> Value + Send + Sync + 'static,
    {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> UploaderConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the configuration. Applies from the next enqueue or batch.
    pub fn set_config(&self, config: UploaderConfig) -> Result<(), UploadError> {
        self.transport.apply_config(&config)?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    /// Checks `file` against the current validation rules.
    pub fn validate(&self, file: &UploadFile) -> Result<(), ValidationError> {
        validate_file(&file.name, file.size, &self.config().validation_rules())
    }

    /// Queues files and returns their new task ids.
    ///
    /// Files that fail validation are queued directly in `error` and never
    /// touch the network. Image previews are built in the background when a
    /// tokio runtime is available.
    pub fn add_files(&self, mut files: Vec<UploadFile>) -> Vec<String> {
        let config = self.config();

        if config.single_file && files.len() > 1 {
            let discarded: Vec<&str> = files[1..].iter().map(|f| f.name.as_str()).collect();
            warn!(?discarded, "single-file mode: keeping only the first file");
            files.truncate(1);
        }

        let rules = config.validation_rules();
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let verdict = validate_file(&file.name, file.size, &rules);
            let preview_file = wants_preview(&file, config.preview_max_bytes).then(|| file.clone());

            let id = {
                let mut table = self.table();
                let id = table.insert(file);
                if let Err(e) = verdict {
                    debug!(task = %id, error = %e, "file rejected");
                    table.fail(&id, e.to_string());
                }
                id
            };

            if let Some(file) = preview_file {
                self.spawn_preview(id.clone(), file, config.preview_max_bytes);
            }
            ids.push(id);
        }
        ids
    }

    fn spawn_preview(&self, id: String, file: UploadFile, max_bytes: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(task = %id, "no runtime, skipping preview");
            return;
        };
        let tasks = Arc::clone(&self.tasks);
        handle.spawn(async move {
            if let Some(preview) = build_preview(&file, max_bytes).await {
                tasks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .set_preview(&id, preview);
            }
        });
    }

    /// Removes a task that is not part of the running batch.
    pub fn remove_file(&self, id: &str) -> Option<UploadTask> {
        let members = self.members();
        if members.contains(id) {
            warn!(task = %id, "refusing to remove a task of the running batch");
            return None;
        }
        self.table().remove(id)
    }

    /// Drops every completed, failed or aborted task outside the running
    /// batch.
    pub fn clear_finished(&self) -> usize {
        let members = self.members();
        self.table().clear_finished(&members)
    }

    /// Snapshot of every task in queue order.
    pub fn tasks(&self) -> Vec<UploadTask> {
        self.table().snapshot()
    }

    pub fn task(&self, id: &str) -> Option<UploadTask> {
        self.table().get(id).cloned()
    }

    /// Uploads every pending task, one after another.
    ///
    /// A file that fails is marked `error` and the batch moves on. Emits
    /// exactly one [`UploadEvent::UploadComplete`] carrying the tasks that
    /// were pending when the batch started, and returns the same list.
    pub async fn start_upload(&self) -> Vec<UploadTask> {
        let _running = self.batch_lock.lock().await;

        let batch = {
            let mut members = self.members();
            let ids = self.table().pending_ids();
            members.extend(ids.iter().cloned());
            ids
        };
        let cancel = CancellationToken::new();
        *self
            .batch_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = cancel.clone();

        if batch.is_empty() {
            debug!("no pending files");
        } else {
            self.run_batch(&batch, &cancel).await;
        }

        let tasks = self.table().snapshot_of(&batch);
        self.members().clear();
        let _ = self.events_tx.send(UploadEvent::UploadComplete {
            tasks: tasks.clone(),
        });
        tasks
    }

    async fn run_batch(&self, batch: &[String], cancel: &CancellationToken) {
        let config = self.config();
        info!(files = batch.len(), chunk_size = config.chunk_size_bytes(), "batch started");

        for id in batch {
            if cancel.is_cancelled() {
                info!("batch cancelled");
                break;
            }
            if !self.table().begin(id) {
                debug!(task = %id, "task no longer pending, skipping");
                continue;
            }

            let upload = FileUpload {
                transport: self.transport.as_ref(),
                normalizer: self.normalizer.as_ref(),
                tasks: &self.tasks,
                events: &self.events_tx,
                cancel: cancel.clone(),
                chunk_size: config.chunk_size_bytes(),
                folder: config.folder.clone(),
            };

            match upload.run(id).await {
                Ok(task) => {
                    info!(task = %id, file = %task.file.name, bytes = task.file.size, "upload completed");
                }
                Err(UploadError::Cancelled) => {
                    if self.table().abort(id, ABORT_REASON).is_some() {
                        debug!(task = %id, "task aborted by batch cancellation");
                    }
                }
                Err(e) => {
                    error!(task = %id, error = %e, "upload failed");
                    self.table().fail(id, e.to_string());
                }
            }
        }

        info!(files = batch.len(), "batch finished");
    }

    /// Cancels the running batch and discards every started session.
    ///
    /// Every pending or uploading task becomes `aborted`. Tasks that already
    /// have a server session get a best-effort abort call; its failure is
    /// logged only. Emits one [`UploadEvent::UploadAborted`] and returns the
    /// affected tasks.
    pub async fn abort_upload(&self) -> Vec<UploadTask> {
        let affected = {
            let mut table = self.table();
            self.batch_cancel
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cancel();
            table.abort_active(ABORT_REASON)
        };

        for task in &affected {
            let Some(session) = &task.session else {
                continue;
            };
            let req = AbortRequest::from(session);
            match self.transport.abort(&req).await {
                Ok(()) => debug!(task = %task.id, upload_id = %session.upload_id, "session discarded"),
                Err(e) => {
                    warn!(task = %task.id, upload_id = %session.upload_id, error = %e, "abort cleanup failed");
                }
            }
        }

        info!(tasks = affected.len(), "upload aborted");
        let _ = self.events_tx.send(UploadEvent::UploadAborted {
            tasks: affected.clone(),
        });
        affected
    }

    fn table(&self) -> MutexGuard<'_, TaskTable> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn members(&self) -> MutexGuard<'_, HashSet<String>> {
        self.batch_members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
