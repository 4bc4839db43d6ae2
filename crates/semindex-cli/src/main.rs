//! Semindex CLI
//!
//! Structure-aware chunking and semantic indexing for code.

use anyhow::Result;
use clap::Parser;

mod app;
mod commands;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    match cli.command {
        Commands::Chunk(args) => commands::chunk::run(args).await,
        Commands::Languages => commands::languages::run().await,
        Commands::Index(args) => commands::index::run(args).await,
    }
}
