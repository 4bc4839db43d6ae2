//! Embedding collaborators

pub mod http;

pub use http::HttpEmbedder;

use crate::chunk::Chunk;
use crate::error::Result;
use async_trait::async_trait;

/// A chunk paired with its embedding vector
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of chunks
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<EmbeddedChunk>>;

    /// Embed a free-form query string
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get model name
    fn model_name(&self) -> &str;
}
