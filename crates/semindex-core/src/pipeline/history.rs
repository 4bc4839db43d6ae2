//! Task history recording

use crate::error::{Result, SemIndexError};
use crate::pipeline::types::{CounterSnapshot, JobStatus};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Identity of one indexing job in the history log
#[derive(Debug, Clone, Default)]
pub struct TaskMeta {
    pub sync_id: i64,
    pub request_id: String,
    pub codebase_id: i64,
    pub codebase_path: String,
}

/// One row of task history
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: i64,
    pub sync_id: i64,
    pub request_id: String,
    pub codebase_id: i64,
    pub codebase_path: String,
    pub status: JobStatus,
    pub counters: Option<CounterSnapshot>,
    pub error_message: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

/// Durable record of indexing jobs and their terminal states
#[async_trait]
pub trait TaskHistoryRecorder: Send + Sync {
    /// Insert a pending row for a starting job, returning its id
    async fn start(&self, meta: &TaskMeta) -> Result<i64>;

    /// Mark a job successful with its final counters
    async fn mark_success(&self, id: i64, counters: &CounterSnapshot) -> Result<()>;

    /// Mark a job failed, or timed out when the error is a timeout
    async fn mark_failed(&self, id: i64, error: &SemIndexError) -> Result<()>;
}

fn terminal_status(error: &SemIndexError) -> JobStatus {
    if error.is_timeout() {
        JobStatus::Timeout
    } else {
        JobStatus::Failed
    }
}

/// Task history held in memory, for tests and the CLI demo
#[derive(Debug, Default)]
pub struct MemoryTaskHistory {
    records: Mutex<Vec<TaskRecord>>,
}

impl MemoryTaskHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded rows
    pub fn records(&self) -> Vec<TaskRecord> {
        self.records
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskHistoryRecorder for MemoryTaskHistory {
    async fn start(&self, meta: &TaskMeta) -> Result<i64> {
        let mut rows = self
            .records
            .lock()
            .map_err(|e| SemIndexError::History(e.to_string()))?;
        let id = rows.len() as i64 + 1;
        rows.push(TaskRecord {
            id,
            sync_id: meta.sync_id,
            request_id: meta.request_id.clone(),
            codebase_id: meta.codebase_id,
            codebase_path: meta.codebase_path.clone(),
            status: JobStatus::Pending,
            counters: None,
            error_message: None,
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
        });
        Ok(id)
    }

    async fn mark_success(&self, id: i64, counters: &CounterSnapshot) -> Result<()> {
        let mut rows = self
            .records
            .lock()
            .map_err(|e| SemIndexError::History(e.to_string()))?;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| SemIndexError::History(format!("task {id} not found")))?;
        row.status = JobStatus::Success;
        row.counters = Some(*counters);
        row.finished_at = Some(Utc::now().to_rfc3339());
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &SemIndexError) -> Result<()> {
        let mut rows = self
            .records
            .lock()
            .map_err(|e| SemIndexError::History(e.to_string()))?;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| SemIndexError::History(format!("task {id} not found")))?;
        row.status = terminal_status(error);
        row.error_message = Some(error.to_string());
        row.finished_at = Some(Utc::now().to_rfc3339());
        Ok(())
    }
}

const TASK_HISTORY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS task_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sync_id INTEGER NOT NULL,
    request_id TEXT NOT NULL,
    codebase_id INTEGER NOT NULL,
    codebase_path TEXT NOT NULL,
    status TEXT NOT NULL,
    total_files INTEGER,
    success_files INTEGER,
    failed_files INTEGER,
    ignored_files INTEGER,
    error_message TEXT,
    started_at TEXT NOT NULL,
    finished_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_task_history_codebase ON task_history(codebase_id);
"#;

/// Task history persisted to SQLite, schema created on open
pub struct SqliteTaskHistory {
    conn: Mutex<Connection>,
}

impl SqliteTaskHistory {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(TASK_HISTORY_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(TASK_HISTORY_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fetch one row by id
    pub fn fetch(&self, id: i64) -> Result<Option<TaskRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SemIndexError::History(e.to_string()))?;
        let record = conn
            .query_row(
                "SELECT id, sync_id, request_id, codebase_id, codebase_path, status,
                        total_files, success_files, failed_files, ignored_files,
                        error_message, started_at, finished_at
                 FROM task_history WHERE id = ?1",
                params![id],
                |row| {
                    let status: String = row.get(5)?;
                    let total: Option<i64> = row.get(6)?;
                    let success: Option<i64> = row.get(7)?;
                    let failed: Option<i64> = row.get(8)?;
                    let ignored: Option<i64> = row.get(9)?;
                    let counters = total.map(|t| CounterSnapshot {
                        total: t as usize,
                        success: success.unwrap_or(0) as usize,
                        failed: failed.unwrap_or(0) as usize,
                        ignored: ignored.unwrap_or(0) as usize,
                    });
                    Ok(TaskRecord {
                        id: row.get(0)?,
                        sync_id: row.get(1)?,
                        request_id: row.get(2)?,
                        codebase_id: row.get(3)?,
                        codebase_path: row.get(4)?,
                        status: status.parse().unwrap_or(JobStatus::Failed),
                        counters,
                        error_message: row.get(10)?,
                        started_at: row.get(11)?,
                        finished_at: row.get(12)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

#[async_trait]
impl TaskHistoryRecorder for SqliteTaskHistory {
    async fn start(&self, meta: &TaskMeta) -> Result<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SemIndexError::History(e.to_string()))?;
        conn.execute(
            "INSERT INTO task_history (sync_id, request_id, codebase_id, codebase_path, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                meta.sync_id,
                meta.request_id,
                meta.codebase_id,
                meta.codebase_path,
                JobStatus::Pending.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn mark_success(&self, id: i64, counters: &CounterSnapshot) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SemIndexError::History(e.to_string()))?;
        let affected = conn.execute(
            "UPDATE task_history
             SET status = ?1, total_files = ?2, success_files = ?3, failed_files = ?4,
                 ignored_files = ?5, finished_at = ?6
             WHERE id = ?7",
            params![
                JobStatus::Success.as_str(),
                counters.total as i64,
                counters.success as i64,
                counters.failed as i64,
                counters.ignored as i64,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        if affected == 0 {
            return Err(SemIndexError::History(format!("task {id} not found")));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &SemIndexError) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SemIndexError::History(e.to_string()))?;
        let affected = conn.execute(
            "UPDATE task_history SET status = ?1, error_message = ?2, finished_at = ?3 WHERE id = ?4",
            params![
                terminal_status(error).as_str(),
                error.to_string(),
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        if affected == 0 {
            return Err(SemIndexError::History(format!("task {id} not found")));
        }
        Ok(())
    }
}
