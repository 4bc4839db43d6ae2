//! Concurrent indexing pipeline.
//!
//! Drives one indexing job end to end: chunk every file under a bounded
//! worker pool, embed the accumulated chunks in batches, then persist the
//! vectors with delete-then-insert semantics. Per-file failures are tallied
//! and aggregated rather than aborting the job; only cancellation stops a
//! job early. Every job reaches a terminal state in both the task history
//! and the progress store.

pub mod history;
pub mod processor;
pub mod progress;
pub mod types;

pub use history::{
    MemoryTaskHistory, SqliteTaskHistory, TaskHistoryRecorder, TaskMeta, TaskRecord,
};
pub use processor::FileProcessor;
pub use progress::{
    FileProgress, FileStatus, MemoryProgressStore, ProgressRecord, ProgressStatus, ProgressStore,
    ProgressUpdate,
};
pub use types::{CounterSnapshot, IndexTaskParams, JobOutcome, JobStatus, ProcessingCounters};

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::chunk::{Chunk, CodeChunker, SourceFile};
use crate::config::Config;
use crate::embed::{EmbeddedChunk, Embedder};
use crate::error::SemIndexError;
use crate::store::{upsert_chunks, UpsertOutcome, VectorStore};
use crate::Result;

/// Cap on individual errors preserved inside a joined job error.
pub(crate) const MAX_JOINED_ERRORS: usize = 10;

/// Number of newly embedded files between progress checkpoints.
const PROGRESS_CHECKPOINT_FILES: usize = 10;

/// Orchestrates indexing jobs over the chunker, embedder and stores.
///
/// The pipeline itself is stateless between jobs; all job state lives in
/// the task history and progress stores keyed by the job's request id.
pub struct IndexingPipeline {
    chunker: Arc<CodeChunker>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    history: Arc<dyn TaskHistoryRecorder>,
    progress: Arc<dyn ProgressStore>,
    max_concurrency: usize,
    batch_size: usize,
}

impl IndexingPipeline {
    /// Build a pipeline from configuration and collaborators.
    ///
    /// Chunking options are validated here so a misconfigured sliding
    /// window is rejected before any job runs.
    pub fn new(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        history: Arc<dyn TaskHistoryRecorder>,
        progress: Arc<dyn ProgressStore>,
    ) -> Result<Self> {
        let options = config.indexing.chunking_options();
        options.validate()?;
        Ok(Self {
            chunker: Arc::new(CodeChunker::new(options)?),
            embedder,
            store,
            history,
            progress,
            max_concurrency: config.indexing.max_concurrency,
            batch_size: config.embedding.batch_size.max(1),
        })
    }

    /// Run one indexing job to a terminal state.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// returned [`JobOutcome`]. Cancelling `cancel` stops the job at the
    /// next checkpoint and yields a `Timeout` outcome without touching
    /// the vector store.
    pub async fn run(&self, params: IndexTaskParams, cancel: CancellationToken) -> JobOutcome {
        let started = Instant::now();
        let params = Arc::new(params);
        let job_key = params.request_id.clone();
        info!(
            request_id = %params.request_id,
            codebase = %params.codebase_name,
            files = params.files.len(),
            deleted = params.deleted_files.len(),
            "indexing job started"
        );

        let meta = TaskMeta {
            sync_id: params.sync_id,
            request_id: params.request_id.clone(),
            codebase_id: params.codebase_id,
            codebase_path: params.codebase_path.clone(),
        };
        let history_id = match self.history.start(&meta).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "could not record task start, aborting job");
                return JobOutcome {
                    status: JobStatus::Failed,
                    counters: CounterSnapshot::default(),
                    error: Some(e),
                };
            }
        };

        let counters = Arc::new(ProcessingCounters::with_total(params.total_files));
        let outcome = self
            .run_phases(&params, &job_key, history_id, &counters, &cancel)
            .await;

        info!(
            request_id = %params.request_id,
            status = %outcome.status,
            total = outcome.counters.total,
            success = outcome.counters.success,
            failed = outcome.counters.failed,
            ignored = outcome.counters.ignored,
            cost_ms = started.elapsed().as_millis() as u64,
            "indexing job finished"
        );
        outcome
    }

    async fn run_phases(
        &self,
        params: &Arc<IndexTaskParams>,
        job_key: &str,
        history_id: i64,
        counters: &Arc<ProcessingCounters>,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        let total_files = params.total_files;
        let mut aggregate: Vec<SemIndexError> = Vec::new();

        let mut pending: Vec<String> = params.files.keys().cloned().collect();
        pending.sort();
        self.publish(job_key, move |rec| {
            rec.status = ProgressStatus::Processing;
            rec.total_progress = 0;
            rec.total_files = total_files;
            rec.message = "chunking files".to_string();
            rec.file_list = pending
                .into_iter()
                .map(|path| FileProgress {
                    path,
                    status: FileStatus::Pending,
                })
                .collect();
        })
        .await;

        let accumulated: Arc<Mutex<Vec<Chunk>>> = Arc::new(Mutex::new(Vec::new()));
        let file_paths: Vec<String> = params.files.keys().cloned().collect();
        let processor = FileProcessor::new(self.max_concurrency);

        let per_file = {
            let params = Arc::clone(params);
            let counters = Arc::clone(counters);
            let accumulated = Arc::clone(&accumulated);
            let chunker = Arc::clone(&self.chunker);
            let progress = Arc::clone(&self.progress);
            let job_key = job_key.to_string();
            move |path: String| {
                let params = Arc::clone(&params);
                let counters = Arc::clone(&counters);
                let accumulated = Arc::clone(&accumulated);
                let chunker = Arc::clone(&chunker);
                let progress = Arc::clone(&progress);
                let job_key = job_key.clone();
                async move {
                    let file = SourceFile {
                        codebase_id: params.codebase_id,
                        codebase_path: params.codebase_path.clone(),
                        codebase_name: params.codebase_name.clone(),
                        path: path.clone(),
                        content: params.files.get(&path).cloned().unwrap_or_default(),
                        language: None,
                    };

                    let (status, result) = match chunker.split(&file) {
                        Ok(chunks) => {
                            debug!(path = %path, chunks = chunks.len(), "file chunked");
                            if let Ok(mut acc) = accumulated.lock() {
                                acc.extend(chunks);
                            }
                            counters.success.fetch_add(1, Ordering::SeqCst);
                            (FileStatus::Processing, Ok(()))
                        }
                        Err(e) if e.is_ignorable() => {
                            debug!(path = %path, reason = %e, "file ignored");
                            counters.ignored.fetch_add(1, Ordering::SeqCst);
                            (FileStatus::Complete, Ok(()))
                        }
                        Err(e) => {
                            warn!(path = %path, error = %e, "chunking failed");
                            counters.failed.fetch_add(1, Ordering::SeqCst);
                            (FileStatus::Failed, Err(e))
                        }
                    };

                    let pct = percent(counters.processed(), total_files);
                    let update_path = path.clone();
                    if let Err(e) = progress
                        .update(
                            &job_key,
                            Box::new(move |rec| {
                                rec.set_file_status(&update_path, status);
                                rec.total_progress = rec.total_progress.max(pct);
                            }),
                        )
                        .await
                    {
                        warn!(error = %e, "progress update failed");
                    }
                    result
                }
            }
        };

        match processor.process(file_paths, cancel, per_file).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                return self.finish_failed(job_key, history_id, counters, e).await;
            }
            Err(e) => aggregate.push(e),
        }

        let chunks = match accumulated.lock() {
            Ok(mut acc) => std::mem::take(&mut *acc),
            Err(_) => Vec::new(),
        };
        info!(chunks = chunks.len(), "chunking phase complete");

        let mut embedded: Vec<EmbeddedChunk> = Vec::with_capacity(chunks.len());
        if !chunks.is_empty() {
            let mut seen_files: HashSet<String> = HashSet::new();
            let mut checkpoint: Vec<String> = Vec::new();

            for batch in chunks.chunks(self.batch_size) {
                if cancel.is_cancelled() {
                    let e = SemIndexError::Timeout(
                        "job cancelled before embedding completed".to_string(),
                    );
                    return self.finish_failed(job_key, history_id, counters, e).await;
                }

                match self.embedder.embed_chunks(batch).await {
                    Ok(batch_embedded) => {
                        for ec in &batch_embedded {
                            if seen_files.insert(ec.chunk.file_path.clone()) {
                                checkpoint.push(ec.chunk.file_path.clone());
                                if seen_files.len() % PROGRESS_CHECKPOINT_FILES == 0 {
                                    let done = std::mem::take(&mut checkpoint);
                                    self.publish_embed_progress(
                                        job_key,
                                        done,
                                        seen_files.len(),
                                        total_files,
                                    )
                                    .await;
                                }
                            }
                        }
                        embedded.extend(batch_embedded);
                    }
                    Err(e) => {
                        warn!(error = %e, chunks = batch.len(), "embedding batch failed, dropping batch");
                        let mut failed_paths: Vec<String> = batch
                            .iter()
                            .map(|c| c.file_path.clone())
                            .filter(|p| !seen_files.contains(p))
                            .collect();
                        failed_paths.sort();
                        failed_paths.dedup();
                        if !failed_paths.is_empty() {
                            self.publish(job_key, move |rec| {
                                for path in &failed_paths {
                                    rec.set_file_status(path, FileStatus::Failed);
                                }
                            })
                            .await;
                        }
                        aggregate.push(e);
                    }
                }
            }

            let done = std::mem::take(&mut checkpoint);
            self.publish(job_key, move |rec| {
                for path in &done {
                    rec.set_file_status(path, FileStatus::Complete);
                }
                rec.total_progress = rec.total_progress.max(100);
                rec.message = "embedding complete".to_string();
            })
            .await;
        }

        if !params.deleted_files.is_empty() {
            match self
                .store
                .delete(params.codebase_id, &params.deleted_files)
                .await
            {
                Ok(()) => {
                    debug!(files = params.deleted_files.len(), "removed files deleted from vector store");
                }
                Err(e) => {
                    warn!(error = %e, files = params.deleted_files.len(), "vector delete for removed files failed");
                    aggregate.push(e);
                }
            }
        }

        if !embedded.is_empty() {
            match upsert_chunks(self.store.as_ref(), params.codebase_id, &embedded).await {
                UpsertOutcome::Completed => {
                    debug!(chunks = embedded.len(), "chunks upserted");
                }
                outcome => {
                    let phase = match &outcome {
                        UpsertOutcome::DeleteFailed(_) => "delete",
                        _ => "insert",
                    };
                    warn!(phase, chunks = embedded.len(), "upsert failed, counting chunked files as failed");
                    counters.mark_successes_failed();
                    if let Some(e) = outcome.into_error() {
                        aggregate.push(e);
                    }
                }
            }
        }

        let snapshot = counters.snapshot();
        if !aggregate.is_empty() {
            let joined = SemIndexError::join(aggregate, MAX_JOINED_ERRORS);
            return self
                .finish_failed(job_key, history_id, counters, joined)
                .await;
        }

        if let Err(e) = self.history.mark_success(history_id, &snapshot).await {
            error!(error = %e, "could not record task success");
            return self.finish_failed(job_key, history_id, counters, e).await;
        }

        self.publish(job_key, |rec| {
            rec.status = ProgressStatus::Complete;
            rec.total_progress = 100;
            rec.message = "indexing complete".to_string();
        })
        .await;

        JobOutcome {
            status: JobStatus::Success,
            counters: snapshot,
            error: None,
        }
    }

    /// Record a terminal failure in history and progress.
    ///
    /// The progress record still goes terminal when the history update
    /// fails; that secondary failure is only logged.
    async fn finish_failed(
        &self,
        job_key: &str,
        history_id: i64,
        counters: &ProcessingCounters,
        error: SemIndexError,
    ) -> JobOutcome {
        let status = if error.is_timeout() {
            JobStatus::Timeout
        } else {
            JobStatus::Failed
        };
        warn!(status = %status, error = %error, "indexing job did not succeed");

        if let Err(he) = self.history.mark_failed(history_id, &error).await {
            error!(error = %he, "could not record task failure");
        }

        let message = error.to_string();
        self.publish(job_key, move |rec| {
            rec.status = ProgressStatus::Failed;
            rec.message = message;
        })
        .await;

        JobOutcome {
            status,
            counters: counters.snapshot(),
            error: Some(error),
        }
    }

    async fn publish_embed_progress(
        &self,
        job_key: &str,
        completed: Vec<String>,
        seen: usize,
        total_files: usize,
    ) {
        let denominator = if total_files > 0 { total_files } else { seen.max(1) };
        let pct = percent(seen, denominator);
        self.publish(job_key, move |rec| {
            for path in &completed {
                rec.set_file_status(path, FileStatus::Complete);
            }
            rec.total_progress = rec.total_progress.max(pct);
            rec.message = "embedding chunks".to_string();
        })
        .await;
    }

    async fn publish(
        &self,
        job_key: &str,
        apply: impl FnOnce(&mut ProgressRecord) + Send + 'static,
    ) {
        if let Err(e) = self.progress.update(job_key, Box::new(apply)).await {
            warn!(error = %e, "progress update failed");
        }
    }
}

/// Integer completion percentage, saturating at 100.
fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed * 100) / total).min(100) as u8
}
