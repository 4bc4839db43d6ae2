//! Bounded-concurrency file processing

use crate::error::{Result, SemIndexError};
use crate::pipeline::MAX_JOINED_ERRORS;
use futures::future::join_all;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Worker pool running one closure per item under a concurrency bound.
///
/// Cancellation stops dispatch and returns immediately without draining
/// in-flight workers; detached work is bounded by the pool size. Each worker
/// also observes the token at its own entry and exits without running its
/// item when cancelled.
pub struct FileProcessor {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl FileProcessor {
    /// `max_concurrency == 0` falls back to the default pool size
    pub fn new(max_concurrency: usize) -> Self {
        let permits = if max_concurrency == 0 {
            crate::DEFAULT_MAX_CONCURRENCY
        } else {
            max_concurrency
        };
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            max_concurrency: permits,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Process every item, collecting per-item errors.
    ///
    /// Items are dispatched as permits free up; one item's failure never
    /// aborts the others. Returns a timeout error when `cancel` fires before
    /// all items finish, and otherwise the per-item errors joined with the
    /// most recent [`MAX_JOINED_ERRORS`] kept.
    pub async fn process<T, F, Fut>(
        &self,
        items: Vec<T>,
        cancel: &CancellationToken,
        per_item: F,
    ) -> Result<()>
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let total = items.len();
        let start = Instant::now();
        let per_item = Arc::new(per_item);
        let errors: Arc<Mutex<Vec<SemIndexError>>> = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::with_capacity(total);

        for item in items {
            if cancel.is_cancelled() {
                info!(
                    total,
                    submitted = handles.len(),
                    "cancellation observed, stopping dispatch"
                );
                return Err(SemIndexError::Timeout(
                    "job cancelled before all files were dispatched".to_string(),
                ));
            }

            let permit = tokio::select! {
                permit = Arc::clone(&self.semaphore).acquire_owned() => {
                    permit.map_err(|e| SemIndexError::Other(anyhow::Error::new(e)))?
                }
                _ = cancel.cancelled() => {
                    info!(
                        total,
                        submitted = handles.len(),
                        "cancellation observed while waiting for a worker slot"
                    );
                    return Err(SemIndexError::Timeout(
                        "job cancelled before all files were dispatched".to_string(),
                    ));
                }
            };

            let per_item = Arc::clone(&per_item);
            let errors = Arc::clone(&errors);
            let worker_cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                if worker_cancel.is_cancelled() {
                    return;
                }
                if let Err(e) = per_item(item).await {
                    if let Ok(mut errs) = errors.lock() {
                        errs.push(e);
                    }
                }
            }));
        }

        tokio::select! {
            _ = join_all(handles) => {}
            _ = cancel.cancelled() => {
                info!(total, elapsed_ms = start.elapsed().as_millis() as u64,
                    "cancellation observed while waiting for workers");
                return Err(SemIndexError::Timeout(
                    "job cancelled while files were processing".to_string(),
                ));
            }
        }

        debug!(
            total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "all items processed"
        );

        let collected = errors
            .lock()
            .map(|mut errs| std::mem::take(&mut *errs))
            .unwrap_or_default();
        if collected.is_empty() {
            Ok(())
        } else {
            Err(SemIndexError::join(collected, MAX_JOINED_ERRORS))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_items_complete_under_bound() {
        let processor = FileProcessor::new(4);
        let completed = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..25).collect();
        let cancel = CancellationToken::new();

        let result = {
            let completed = Arc::clone(&completed);
            let in_flight = Arc::clone(&in_flight);
            let max_in_flight = Arc::clone(&max_in_flight);
            processor
                .process(items, &cancel, move |_item| {
                    let completed = Arc::clone(&completed);
                    let in_flight = Arc::clone(&in_flight);
                    let max_in_flight = Arc::clone(&max_in_flight);
                    async move {
                        let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_flight.fetch_max(current, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        completed.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await
        };

        assert!(result.is_ok());
        assert_eq!(completed.load(Ordering::SeqCst), 25);
        assert!(max_in_flight.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_short_circuits() {
        let processor = FileProcessor::new(2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let touched = Arc::new(AtomicUsize::new(0));
        let result = {
            let touched = Arc::clone(&touched);
            processor
                .process(vec![1, 2, 3], &cancel, move |_| {
                    let touched = Arc::clone(&touched);
                    async move {
                        touched.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await
        };

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(touched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancel_during_processing_returns_timeout() {
        let processor = FileProcessor::new(2);
        let cancel = CancellationToken::new();
        let completed = Arc::new(AtomicUsize::new(0));

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = {
            let completed = Arc::clone(&completed);
            processor
                .process((0..10).collect(), &cancel, move |_: usize| {
                    let completed = Arc::clone(&completed);
                    async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        completed.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await
        };

        assert!(result.unwrap_err().is_timeout());
        assert!(completed.load(Ordering::SeqCst) < 10);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_others() {
        let processor = FileProcessor::new(2);
        let cancel = CancellationToken::new();
        let succeeded = Arc::new(AtomicUsize::new(0));

        let result = {
            let succeeded = Arc::clone(&succeeded);
            processor
                .process((0..5).collect(), &cancel, move |item: usize| {
                    let succeeded = Arc::clone(&succeeded);
                    async move {
                        if item == 2 {
                            Err(SemIndexError::Parse("file-2 broken".into()))
                        } else {
                            succeeded.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    }
                })
                .await
        };

        let err = result.unwrap_err();
        assert!(err.to_string().contains("file-2 broken"));
        assert_eq!(succeeded.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_error_cap_keeps_most_recent() {
        // serial pool keeps error order deterministic
        let processor = FileProcessor::new(1);
        let cancel = CancellationToken::new();

        let result = processor
            .process((0..15).collect(), &cancel, |item: usize| async move {
                Err(SemIndexError::Parse(format!("file-{item} broken")))
            })
            .await;

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("15 errors"));
        assert!(!msg.contains("file-4 broken"));
        assert!(msg.contains("file-5 broken"));
        assert!(msg.contains("file-14 broken"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_uses_default() {
        let processor = FileProcessor::new(0);
        assert_eq!(processor.max_concurrency(), crate::DEFAULT_MAX_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_empty_items_is_ok() {
        let processor = FileProcessor::new(3);
        let cancel = CancellationToken::new();
        let result = processor
            .process(Vec::<usize>::new(), &cancel, |_| async { Ok(()) })
            .await;
        assert!(result.is_ok());
    }
}
