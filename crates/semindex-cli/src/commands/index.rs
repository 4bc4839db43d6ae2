//! Index command

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::app::IndexArgs;
use semindex_core::{
    Config, Embedder, HttpEmbedder, IndexTaskParams, IndexingPipeline, MemoryProgressStore,
    MemoryTaskHistory, MemoryVectorStore, ProgressStore, TaskHistoryRecorder, VectorStore,
};

pub async fn run(args: IndexArgs) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = args.embedder_url {
        config.embedding.url = url;
    }
    if let Some(model) = args.model {
        config.embedding.model = model;
    }
    if let Some(concurrency) = args.concurrency {
        config.indexing.max_concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.indexing.timeout_secs = timeout;
    }

    let dir = args
        .dir
        .canonicalize()
        .with_context(|| format!("resolving {}", args.dir.display()))?;
    let codebase_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "codebase".to_string());

    let files = collect_files(&dir)?;
    if files.is_empty() {
        anyhow::bail!("no files found under {}", dir.display());
    }

    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(config.embedding.clone())?);
    let store = Arc::new(MemoryVectorStore::new(Arc::clone(&embedder)));
    let history = Arc::new(MemoryTaskHistory::new());
    let progress = Arc::new(MemoryProgressStore::new());
    let pipeline = IndexingPipeline::new(
        &config,
        embedder,
        Arc::clone(&store) as Arc<dyn VectorStore>,
        Arc::clone(&history) as Arc<dyn TaskHistoryRecorder>,
        Arc::clone(&progress) as Arc<dyn ProgressStore>,
    )?;

    let total_files = files.len();
    let params = IndexTaskParams {
        sync_id: 1,
        request_id: format!("cli-{}", chrono::Utc::now().timestamp_millis()),
        codebase_id: 1,
        codebase_path: dir.to_string_lossy().into_owned(),
        codebase_name,
        client_id: "cli".to_string(),
        files,
        deleted_files: Vec::new(),
        total_files,
    };
    let job_key = params.request_id.clone();

    println!("Indexing {} files from {}", total_files, dir.display());

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    let timeout_secs = config.indexing.timeout_secs;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
        deadline.cancel();
    });

    let outcome = pipeline.run(params, cancel).await;

    println!("Job finished: {}", outcome.status);
    println!(
        "  files: {} total, {} indexed, {} failed, {} ignored",
        outcome.counters.total,
        outcome.counters.success,
        outcome.counters.failed,
        outcome.counters.ignored
    );
    println!("  chunks stored: {}", store.len());
    if let Some(record) = progress.get(&job_key).await? {
        println!("  progress: {}% ({})", record.total_progress, record.message);
    }
    if let Some(error) = outcome.error {
        anyhow::bail!("indexing failed: {error}");
    }
    Ok(())
}

/// Read every regular file under `dir`, keyed by path relative to it.
fn collect_files(dir: &std::path::Path) -> Result<HashMap<String, Vec<u8>>> {
    let mut files = HashMap::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        if rel.split('/').any(|part| part.starts_with('.')) {
            continue;
        }
        let content = std::fs::read(entry.path())
            .with_context(|| format!("reading {}", entry.path().display()))?;
        files.insert(rel, content);
    }
    Ok(files)
}
