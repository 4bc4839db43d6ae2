//! Chunk command

use crate::app::ChunkArgs;
use anyhow::{Context, Result};
use semindex_core::{ChunkingOptions, CodeChunker, SourceFile};

pub async fn run(args: ChunkArgs) -> Result<()> {
    let mut options = ChunkingOptions::default();
    if let Some(max_tokens) = args.max_tokens {
        options.max_tokens_per_chunk = max_tokens;
    }
    if let Some(overlap) = args.overlap {
        options.sliding_window_overlap_tokens = overlap;
    }
    options.enable_markdown_parsing = args.markdown;
    options.enable_api_spec_parsing = args.api_spec;
    options.validate()?;

    let content = std::fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let chunker = CodeChunker::new(options)?;
    let file = SourceFile::new(args.path.to_string_lossy().into_owned(), content);

    let chunks = match chunker.split(&file) {
        Ok(chunks) => chunks,
        Err(e) if e.is_ignorable() => {
            println!("ignored: {e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
    } else {
        for (i, chunk) in chunks.iter().enumerate() {
            println!(
                "--- chunk {} [{} tokens] lines {}-{} ({})",
                i,
                chunk.token_count,
                chunk.range[0] + 1,
                chunk.range[2] + 1,
                chunk.language
            );
            println!("{}", chunk.content);
        }
        println!("{} chunks", chunks.len());
    }
    Ok(())
}
