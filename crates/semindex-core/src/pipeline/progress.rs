//! Live job progress, readable by polling

use crate::error::{Result, SemIndexError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Overall state of a progress record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Failed,
}

/// State of one file inside a progress record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProgress {
    pub path: String,
    pub status: FileStatus,
}

/// Snapshot of one job's progress
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub status: ProgressStatus,
    /// Percent complete, 0 to 100
    pub total_progress: u8,
    pub total_files: usize,
    pub message: String,
    pub file_list: Vec<FileProgress>,
}

impl ProgressRecord {
    /// Update the status of one tracked file; unknown paths are ignored
    pub fn set_file_status(&mut self, path: &str, status: FileStatus) {
        if let Some(item) = self.file_list.iter_mut().find(|f| f.path == path) {
            item.status = status;
        }
    }
}

/// Closure applied to a record under the store's write path
pub type ProgressUpdate = Box<dyn FnOnce(&mut ProgressRecord) + Send>;

/// Read-modify-write progress storage.
///
/// `update` loads the record for `job_key` (a default pending record when the
/// key is unknown), applies the closure and writes the result back. Concurrent
/// updates are last-writer-wins per call.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn update(&self, job_key: &str, apply: ProgressUpdate) -> Result<()>;

    async fn get(&self, job_key: &str) -> Result<Option<ProgressRecord>>;
}

/// Progress store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: RwLock<HashMap<String, ProgressRecord>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn update(&self, job_key: &str, apply: ProgressUpdate) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| SemIndexError::Progress(e.to_string()))?;
        let record = records.entry(job_key.to_string()).or_default();
        apply(record);
        Ok(())
    }

    async fn get(&self, job_key: &str) -> Result<Option<ProgressRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| SemIndexError::Progress(e.to_string()))?;
        Ok(records.get(job_key).cloned())
    }
}
