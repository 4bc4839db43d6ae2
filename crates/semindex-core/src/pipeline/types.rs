//! Shared pipeline types

use crate::error::SemIndexError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-job file tallies, updated concurrently by workers
#[derive(Debug, Default)]
pub struct ProcessingCounters {
    pub total: AtomicUsize,
    pub success: AtomicUsize,
    pub failed: AtomicUsize,
    pub ignored: AtomicUsize,
}

impl ProcessingCounters {
    pub fn with_total(total: usize) -> Self {
        let counters = Self::default();
        counters.total.store(total, Ordering::SeqCst);
        counters
    }

    /// Files accounted for so far, in any outcome
    pub fn processed(&self) -> usize {
        self.success.load(Ordering::SeqCst)
            + self.failed.load(Ordering::SeqCst)
            + self.ignored.load(Ordering::SeqCst)
    }

    /// Reclassify every success as a failure after a wholly failed upsert
    pub fn mark_successes_failed(&self) {
        let successes = self.success.swap(0, Ordering::SeqCst);
        self.failed.store(successes, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.total.load(Ordering::SeqCst),
            success: self.success.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            ignored: self.ignored.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of [`ProcessingCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub ignored: usize,
}

/// Inputs for one indexing job, read-only during processing
#[derive(Debug, Clone, Default)]
pub struct IndexTaskParams {
    /// Identifier of the sync event that produced this job
    pub sync_id: i64,
    /// Request id, also the progress-record key
    pub request_id: String,
    pub codebase_id: i64,
    pub codebase_path: String,
    pub codebase_name: String,
    pub client_id: String,
    /// File path to raw content
    pub files: HashMap<String, Vec<u8>>,
    /// Paths removed from the codebase since the last sync
    pub deleted_files: Vec<String>,
    /// Number of files in this job
    pub total_files: usize,
}

/// Final state of one indexing job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Timeout,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = SemIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "success" => Ok(JobStatus::Success),
            "failed" => Ok(JobStatus::Failed),
            "timeout" => Ok(JobStatus::Timeout),
            other => Err(SemIndexError::History(format!(
                "unknown job status: {other}"
            ))),
        }
    }
}

/// Terminal report for one indexing job
#[derive(Debug)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub counters: CounterSnapshot,
    /// Joined error covering the most recent underlying failures
    pub error: Option<SemIndexError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_processed() {
        let counters = ProcessingCounters::with_total(10);
        counters.success.fetch_add(4, Ordering::SeqCst);
        counters.failed.fetch_add(2, Ordering::SeqCst);
        counters.ignored.fetch_add(1, Ordering::SeqCst);
        assert_eq!(counters.processed(), 7);

        let snap = counters.snapshot();
        assert_eq!(snap.total, 10);
        assert_eq!(snap.success, 4);
    }

    #[test]
    fn test_counters_mark_successes_failed() {
        let counters = ProcessingCounters::with_total(5);
        counters.success.fetch_add(4, Ordering::SeqCst);
        counters.failed.fetch_add(1, Ordering::SeqCst);

        counters.mark_successes_failed();
        let snap = counters.snapshot();
        assert_eq!(snap.success, 0);
        assert_eq!(snap.failed, 4);
    }

    #[test]
    fn test_job_status_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Success,
            JobStatus::Failed,
            JobStatus::Timeout,
        ] {
            let parsed: JobStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<JobStatus>().is_err());
    }
}
