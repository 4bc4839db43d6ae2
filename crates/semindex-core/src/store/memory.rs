//! Brute-force in-memory vector store

use super::{QueryOptions, ScoredChunk, VectorStore};
use crate::chunk::Chunk;
use crate::embed::{EmbeddedChunk, Embedder};
use crate::error::{Result, SemIndexError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

struct StoredPoint {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Vector store backed by a `HashMap`, scored with exact cosine similarity.
///
/// Points are keyed by [`Chunk::id`]. Queries embed the text through the
/// injected embedder. Intended for tests and small corpora; production
/// backends implement the same trait.
pub struct MemoryVectorStore {
    points: RwLock<HashMap<String, StoredPoint>>,
    embedder: Arc<dyn Embedder>,
}

impl MemoryVectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            points: RwLock::new(HashMap::new()),
            embedder,
        }
    }

    pub fn len(&self) -> usize {
        self.points.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryVectorStore")
            .field("points", &self.len())
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<()> {
        let mut points = self
            .points
            .write()
            .map_err(|e| SemIndexError::VectorStore(e.to_string()))?;
        for ec in chunks {
            points.insert(
                ec.chunk.id(),
                StoredPoint {
                    chunk: ec.chunk.clone(),
                    vector: ec.vector.clone(),
                },
            );
        }
        Ok(())
    }

    async fn delete(&self, codebase_id: i64, file_paths: &[String]) -> Result<()> {
        if file_paths.is_empty() {
            return Ok(());
        }
        let mut points = self
            .points
            .write()
            .map_err(|e| SemIndexError::VectorStore(e.to_string()))?;
        points.retain(|_, sp| {
            sp.chunk.codebase_id != codebase_id || !file_paths.contains(&sp.chunk.file_path)
        });
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        opts: &QueryOptions,
    ) -> Result<Vec<ScoredChunk>> {
        let vector = self.embedder.embed_query(text).await?;
        let points = self
            .points
            .read()
            .map_err(|e| SemIndexError::VectorStore(e.to_string()))?;

        let mut scored: Vec<ScoredChunk> = points
            .values()
            .filter(|sp| {
                opts.codebase_id
                    .map_or(true, |id| sp.chunk.codebase_id == id)
            })
            .map(|sp| ScoredChunk {
                chunk: sp.chunk.clone(),
                score: cosine_similarity(&vector, &sp.vector),
            })
            .filter(|sc| opts.min_score.map_or(true, |min| sc.score >= min))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
