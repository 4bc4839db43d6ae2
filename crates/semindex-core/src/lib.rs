//! Semindex Core Library
//!
//! Core functionality for the semindex code semantic-search backend.
//!
//! # Features
//! - Structure-aware code chunking via tree-sitter, with token budgets
//! - Markdown section chunking and OpenAPI/Swagger endpoint chunking
//! - Sliding-window fallback for oversized spans
//! - Concurrent indexing pipeline with bounded workers and cancellation
//! - Embedding over an OpenAI-compatible HTTP endpoint
//! - Vector upsert with per-job progress and task history

pub mod chunk;
pub mod config;
pub mod embed;
pub mod error;
pub mod pipeline;
pub mod store;

pub use chunk::{Chunk, ChunkingOptions, CodeChunker, Language, SourceFile, TokenCounter};
pub use config::{Config, EmbeddingConfig, IndexingConfig};
pub use error::{Result, SemIndexError};
pub use embed::{EmbeddedChunk, Embedder, HttpEmbedder};
pub use pipeline::{
    CounterSnapshot, FileProcessor, FileProgress, FileStatus, IndexTaskParams, IndexingPipeline,
    JobOutcome, JobStatus, MemoryProgressStore, MemoryTaskHistory, ProcessingCounters,
    ProgressRecord, ProgressStatus, ProgressStore, SqliteTaskHistory, TaskHistoryRecorder,
    TaskMeta, TaskRecord,
};
pub use store::{
    upsert_chunks, MemoryVectorStore, QueryOptions, ScoredChunk, UpsertOutcome, VectorStore,
};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "semindex";

/// Default token budget for a single chunk
pub const DEFAULT_MAX_TOKENS_PER_CHUNK: usize = 512;

/// Default sliding-window overlap in tokens
pub const DEFAULT_OVERLAP_TOKENS: usize = 128;

/// Default number of concurrent file workers
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Default number of chunks per embedding request
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;
