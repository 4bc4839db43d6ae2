//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "semindex")]
#[command(
    author,
    version,
    about = "Structure-aware chunking and semantic indexing for code"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chunk a single file and print the chunks
    Chunk(ChunkArgs),

    /// List supported languages and their extensions
    Languages,

    /// Index a directory through the full pipeline
    Index(IndexArgs),
}

#[derive(Args)]
pub struct ChunkArgs {
    /// File to chunk
    pub path: PathBuf,

    /// Maximum tokens per chunk
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Overlap tokens between consecutive sliding windows
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Chunk markdown files by section
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub markdown: bool,

    /// Chunk OpenAPI/Swagger JSON files per endpoint
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub api_spec: bool,

    /// Print chunks as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct IndexArgs {
    /// Directory to index
    pub dir: PathBuf,

    /// Embedding service base URL
    #[arg(long)]
    pub embedder_url: Option<String>,

    /// Embedding model name
    #[arg(long)]
    pub model: Option<String>,

    /// Number of concurrent file workers
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Job deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}
