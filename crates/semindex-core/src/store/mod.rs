//! Vector store collaborators

pub mod memory;

pub use memory::MemoryVectorStore;

use crate::chunk::Chunk;
use crate::embed::EmbeddedChunk;
use crate::error::{Result, SemIndexError};
use async_trait::async_trait;
use tracing::debug;

/// A chunk returned from similarity search with its score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Options narrowing a similarity query
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Restrict results to one codebase
    pub codebase_id: Option<i64>,
    /// Drop results scoring below this threshold
    pub min_score: Option<f32>,
}

/// Vector storage trait
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert embedded chunks, overwriting points with the same id
    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<()>;

    /// Delete every chunk stored for the given file paths within a codebase
    async fn delete(&self, codebase_id: i64, file_paths: &[String]) -> Result<()>;

    /// Similarity search by free-form text
    async fn query(&self, text: &str, top_k: usize, opts: &QueryOptions)
        -> Result<Vec<ScoredChunk>>;
}

/// Outcome of a delete-then-insert upsert.
///
/// The two phases are not transactional; the variant names the phase that
/// failed so callers can compensate instead of losing data silently.
#[derive(Debug)]
pub enum UpsertOutcome {
    Completed,
    DeleteFailed(SemIndexError),
    InsertFailedAfterDelete(SemIndexError),
}

impl UpsertOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, UpsertOutcome::Completed)
    }

    /// Consume the outcome, yielding the phase error if any
    pub fn into_error(self) -> Option<SemIndexError> {
        match self {
            UpsertOutcome::Completed => None,
            UpsertOutcome::DeleteFailed(e) | UpsertOutcome::InsertFailedAfterDelete(e) => Some(e),
        }
    }
}

/// Replace all stored chunks for the files covered by `chunks`.
///
/// Stale points for the affected file paths are deleted first, then the new
/// chunks are inserted.
pub async fn upsert_chunks(
    store: &dyn VectorStore,
    codebase_id: i64,
    chunks: &[EmbeddedChunk],
) -> UpsertOutcome {
    if chunks.is_empty() {
        return UpsertOutcome::Completed;
    }

    let mut file_paths: Vec<String> = chunks.iter().map(|c| c.chunk.file_path.clone()).collect();
    file_paths.sort();
    file_paths.dedup();

    debug!(
        codebase_id,
        files = file_paths.len(),
        chunks = chunks.len(),
        "upserting chunks"
    );

    if let Err(e) = store.delete(codebase_id, &file_paths).await {
        return UpsertOutcome::DeleteFailed(e);
    }
    if let Err(e) = store.insert(chunks).await {
        return UpsertOutcome::InsertFailedAfterDelete(e);
    }
    UpsertOutcome::Completed
}
