//! Configuration management

use crate::chunk::ChunkingOptions;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,
}

/// Embedding service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service
    pub url: String,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Number of chunks sent per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Replace newlines with spaces in query text before embedding
    #[serde(default = "default_true")]
    pub strip_new_lines: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("SEMINDEX_EMBEDDING_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: default_embedding_model(),
            api_key: std::env::var("SEMINDEX_EMBEDDING_API_KEY").ok(),
            timeout_secs: default_request_timeout(),
            batch_size: default_batch_size(),
            strip_new_lines: true,
        }
    }
}

fn default_embedding_model() -> String {
    std::env::var("SEMINDEX_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

fn default_request_timeout() -> u64 {
    30
}

fn default_batch_size() -> usize {
    crate::DEFAULT_EMBED_BATCH_SIZE
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Maximum tokens per chunk
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_chunk: usize,

    /// Overlap tokens between consecutive sliding windows
    #[serde(default = "default_overlap_tokens")]
    pub sliding_window_overlap_tokens: usize,

    /// Chunk markdown files by heading/fence structure
    #[serde(default = "default_true")]
    pub enable_markdown_parsing: bool,

    /// Chunk OpenAPI/Swagger JSON files per path entry
    #[serde(default = "default_true")]
    pub enable_api_spec_parsing: bool,

    /// Maximum concurrent file workers per job
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Job deadline in seconds
    #[serde(default = "default_job_timeout")]
    pub timeout_secs: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: default_max_tokens(),
            sliding_window_overlap_tokens: default_overlap_tokens(),
            enable_markdown_parsing: true,
            enable_api_spec_parsing: true,
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_job_timeout(),
        }
    }
}

impl IndexingConfig {
    /// Build the chunking options used by the splitters
    pub fn chunking_options(&self) -> ChunkingOptions {
        ChunkingOptions {
            max_tokens_per_chunk: self.max_tokens_per_chunk,
            sliding_window_overlap_tokens: self.sliding_window_overlap_tokens,
            enable_markdown_parsing: self.enable_markdown_parsing,
            enable_api_spec_parsing: self.enable_api_spec_parsing,
        }
    }
}

fn default_max_tokens() -> usize {
    crate::DEFAULT_MAX_TOKENS_PER_CHUNK
}

fn default_overlap_tokens() -> usize {
    crate::DEFAULT_OVERLAP_TOKENS
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    crate::DEFAULT_MAX_CONCURRENCY
}

fn default_job_timeout() -> u64 {
    300
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}
