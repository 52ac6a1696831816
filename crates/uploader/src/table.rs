//! In-memory table of upload tasks.
//!
//! The table is the only store of task state. Every status change goes
//! through a guarded transition so that a task never leaves a terminal
//! state and its byte count never moves backwards.

use std::collections::{HashMap, HashSet};

use chunkup_protocol::{SessionRef, UploadStatus};
use chunkup_transfer::UploadFile;

use crate::types::UploadTask;

/// Upload tasks keyed by id, kept in insertion order.
#[derive(Debug, Default)]
pub struct TaskTable {
    tasks: HashMap<String, UploadTask>,
    order: Vec<String>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pending task for `file` under a fresh id and returns the id.
    pub fn insert(&mut self, file: UploadFile) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.order.push(id.clone());
        self.tasks.insert(id.clone(), UploadTask::new(id.clone(), file));
        id
    }

    /// Removes a task. Returns it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<UploadTask> {
        let task = self.tasks.remove(id)?;
        self.order.retain(|other| other != id);
        Some(task)
    }

    pub fn get(&self, id: &str) -> Option<&UploadTask> {
        self.tasks.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Clones every task in insertion order.
    pub fn snapshot(&self) -> Vec<UploadTask> {
        self.order
            .iter()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect()
    }

    /// Clones the listed tasks, skipping ids that were removed.
    pub fn snapshot_of(&self, ids: &[String]) -> Vec<UploadTask> {
        ids.iter()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect()
    }

    /// Ids of pending tasks in queue order.
    pub fn pending_ids(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| {
                self.tasks
                    .get(*id)
                    .is_some_and(|t| t.status == UploadStatus::Pending)
            })
            .cloned()
            .collect()
    }

    /// Drops every task in a terminal state except those in `keep`. Returns
    /// how many were removed.
    pub fn clear_finished(&mut self, keep: &HashSet<String>) -> usize {
        let before = self.order.len();
        self.tasks
            .retain(|id, t| !t.status.is_terminal() || keep.contains(id));
        let tasks = &self.tasks;
        self.order.retain(|id| tasks.contains_key(id));
        before - self.order.len()
    }

    /// `pending → uploading`. Resets progress.
    pub fn begin(&mut self, id: &str) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) if task.status == UploadStatus::Pending => {
                task.status = UploadStatus::Uploading;
                task.set_uploaded(0);
                true
            }
            _ => false,
        }
    }

    /// Records the session returned by `initiate`.
    pub fn attach_session(&mut self, id: &str, session: SessionRef) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) if task.status == UploadStatus::Uploading => {
                task.session = Some(session);
                true
            }
            _ => false,
        }
    }

    /// Moves `uploaded_bytes` forward to `uploaded`.
    ///
    /// Only valid while uploading; a smaller value than the current one is
    /// ignored.
    pub fn advance(&mut self, id: &str, uploaded: u64) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) if task.status == UploadStatus::Uploading => {
                if uploaded > task.uploaded_bytes {
                    task.set_uploaded(uploaded.min(task.file.size));
                }
                true
            }
            _ => false,
        }
    }

    /// `uploading → completed`. Forces progress to 100.
    pub fn complete(&mut self, id: &str) -> Option<UploadTask> {
        let task = self.tasks.get_mut(id)?;
        if task.status != UploadStatus::Uploading {
            return None;
        }
        task.status = UploadStatus::Completed;
        task.uploaded_bytes = task.file.size;
        task.progress = 100.0;
        Some(task.clone())
    }

    /// `pending|uploading → error`.
    pub fn fail(&mut self, id: &str, reason: impl Into<String>) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) if task.status.is_active() => {
                task.status = UploadStatus::Error;
                task.error = Some(reason.into());
                true
            }
            _ => false,
        }
    }

    /// `pending|uploading → aborted`.
    pub fn abort(&mut self, id: &str, reason: &str) -> Option<UploadTask> {
        let task = self.tasks.get_mut(id)?;
        if !task.status.is_active() {
            return None;
        }
        task.status = UploadStatus::Aborted;
        task.error = Some(reason.to_string());
        Some(task.clone())
    }

    /// Aborts every pending or uploading task. Returns them in queue order.
    pub fn abort_active(&mut self, reason: &str) -> Vec<UploadTask> {
        let ids: Vec<String> = self
            .order
            .iter()
            .filter(|id| self.tasks.get(*id).is_some_and(|t| t.status.is_active()))
            .cloned()
            .collect();
        ids.iter().filter_map(|id| self.abort(id, reason)).collect()
    }

    /// Stores a preview on a task that still exists.
    pub fn set_preview(&mut self, id: &str, preview: String) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) => {
                task.preview = Some(preview);
                true
            }
            None => false,
        }
    }
}
