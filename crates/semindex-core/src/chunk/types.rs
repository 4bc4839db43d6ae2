//! Core types for chunking

use crate::error::{Result, SemIndexError};
use serde::{Deserialize, Serialize};

/// A file submitted for chunking, owned by the caller for one call
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// Identifier of the codebase this file belongs to
    pub codebase_id: i64,
    /// Root path of the codebase on disk
    pub codebase_path: String,
    /// Human-readable codebase name
    pub codebase_name: String,
    /// Path of the file relative to the codebase root
    pub path: String,
    /// Raw file content
    pub content: Vec<u8>,
    /// Declared language, carried as metadata; splitter routing goes by
    /// extension
    pub language: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

/// A bounded span of file content, the unit that is embedded and stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the codebase this chunk belongs to
    pub codebase_id: i64,
    /// Root path of the codebase on disk
    pub codebase_path: String,
    /// Human-readable codebase name
    pub codebase_name: String,
    /// Language tag: `"code"`, `"markdown"` or `"doc"`
    pub language: String,
    /// Chunk text
    pub content: String,
    /// Path of the originating file
    pub file_path: String,
    /// `[start_line, start_col, end_line, end_col]`, zero-based
    pub range: [usize; 4],
    /// Token count under the embedding model's vocabulary
    pub token_count: usize,
}

impl Chunk {
    /// Stable blake3-derived identifier for vector-store keys
    pub fn id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.codebase_path.as_bytes());
        hasher.update(self.file_path.as_bytes());
        for part in self.range {
            hasher.update(&part.to_le_bytes());
        }
        hasher.update(self.content.as_bytes());
        let hash = hasher.finalize();
        hash.to_hex()[..32].to_string()
    }
}

/// Options governing chunk sizing and format handling, immutable per chunker
#[derive(Debug, Clone, Copy)]
pub struct ChunkingOptions {
    /// Maximum tokens per emitted chunk
    pub max_tokens_per_chunk: usize,
    /// Overlap tokens between consecutive sliding windows
    pub sliding_window_overlap_tokens: usize,
    /// Chunk markdown files by heading/fence structure
    pub enable_markdown_parsing: bool,
    /// Chunk OpenAPI/Swagger JSON files per path entry
    pub enable_api_spec_parsing: bool,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: crate::DEFAULT_MAX_TOKENS_PER_CHUNK,
            sliding_window_overlap_tokens: crate::DEFAULT_OVERLAP_TOKENS,
            enable_markdown_parsing: true,
            enable_api_spec_parsing: true,
        }
    }
}

impl ChunkingOptions {
    /// Window parameters are usable when `max > 0` and `overlap < max`
    pub fn window_valid(&self) -> bool {
        self.max_tokens_per_chunk > 0
            && self.sliding_window_overlap_tokens < self.max_tokens_per_chunk
    }

    /// Reject options that would leave the window splitter unusable
    pub fn validate(&self) -> Result<()> {
        if !self.window_valid() {
            return Err(SemIndexError::InvalidOptions(format!(
                "max_tokens_per_chunk={} sliding_window_overlap_tokens={}",
                self.max_tokens_per_chunk, self.sliding_window_overlap_tokens
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with(content: &str, range: [usize; 4]) -> Chunk {
        Chunk {
            codebase_id: 1,
            codebase_path: "/repo".to_string(),
            codebase_name: "repo".to_string(),
            language: "code".to_string(),
            content: content.to_string(),
            file_path: "src/main.rs".to_string(),
            range,
            token_count: 4,
        }
    }

    #[test]
    fn test_chunk_id_stability() {
        let a = chunk_with("fn foo() {}", [0, 0, 0, 11]);
        let b = chunk_with("fn foo() {}", [0, 0, 0, 11]);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().len(), 32);
    }

    #[test]
    fn test_chunk_id_position_matters() {
        let a = chunk_with("fn foo() {}", [0, 0, 0, 11]);
        let b = chunk_with("fn foo() {}", [5, 0, 5, 11]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_options_window_validity() {
        let mut opts = ChunkingOptions::default();
        assert!(opts.window_valid());

        opts.sliding_window_overlap_tokens = opts.max_tokens_per_chunk;
        assert!(!opts.window_valid());
        assert!(opts.validate().is_err());

        opts.max_tokens_per_chunk = 0;
        opts.sliding_window_overlap_tokens = 0;
        assert!(!opts.window_valid());
    }
}
