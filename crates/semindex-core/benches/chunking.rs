//! Chunking performance benchmarks
//!
//! Measures performance of:
//! - Token counting
//! - Tree-sitter code chunking
//! - Markdown section chunking
//! - OpenAPI endpoint chunking
//! - Sliding-window splitting of oversized spans

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use semindex_core::{ChunkingOptions, CodeChunker, SourceFile, TokenCounter};

const SMALL_RUST: &str = r#"
pub fn add(a: u32, b: u32) -> u32 {
    a + b
}
"#;

const MARKDOWN_DOC: &str = r#"# Service Guide

## Overview

The service indexes code for semantic retrieval. Each file is split into
structure-aware chunks and embedded through an external endpoint.

## Configuration

Set the embedding endpoint and model name:

```yaml
embedding:
  url: http://localhost:8000
  model: all-MiniLM-L6-v2
```

## Operation

Jobs run concurrently with a bounded worker pool. Failed files are
tallied without failing the whole job.
"#;

fn generate_rust_source(functions: usize) -> String {
    let mut src = String::from("//! Generated module\n\nuse std::collections::HashMap;\n\n");
    for i in 0..functions {
        src.push_str(&format!(
            "/// Computes value {i} from the lookup table.\n\
             pub fn compute_{i}(input: &HashMap<String, u64>) -> u64 {{\n\
                 let base = input.get(\"key_{i}\").copied().unwrap_or({i});\n\
                 let scaled = base.wrapping_mul(31).wrapping_add({i});\n\
                 scaled ^ (scaled >> 7)\n\
             }}\n\n",
        ));
    }
    src
}

fn generate_oversized_function(statements: usize) -> String {
    let mut src = String::from("pub fn enormous() -> u64 {\n    let mut acc = 0u64;\n");
    for i in 0..statements {
        src.push_str(&format!(
            "    acc = acc.wrapping_add({i}).wrapping_mul(0x9e3779b9);\n"
        ));
    }
    src.push_str("    acc\n}\n");
    src
}

fn generate_api_spec(paths: usize) -> String {
    let mut spec = String::from(r#"{"openapi":"3.0.0","info":{"title":"bench","version":"1"},"paths":{"#);
    for i in 0..paths {
        if i > 0 {
            spec.push(',');
        }
        spec.push_str(&format!(
            r#""/items/{i}":{{"get":{{"summary":"Fetch item {i}","responses":{{"200":{{"description":"ok"}}}}}}}}"#
        ));
    }
    spec.push_str("}}");
    spec
}

fn bench_token_counting(c: &mut Criterion) {
    let counter = TokenCounter::new().unwrap();
    let mut group = c.benchmark_group("token_counting");

    for (name, content) in &[
        ("small", SMALL_RUST.to_string()),
        ("medium", generate_rust_source(20)),
        ("large", generate_rust_source(200)),
    ] {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), content, |b, content| {
            b.iter(|| counter.count(black_box(content)));
        });
    }

    group.finish();
}

fn bench_code_chunking(c: &mut Criterion) {
    let chunker = CodeChunker::new(ChunkingOptions::default()).unwrap();
    let mut group = c.benchmark_group("code_chunking");

    for (name, content) in &[
        ("small", SMALL_RUST.to_string()),
        ("medium", generate_rust_source(20)),
        ("large", generate_rust_source(200)),
    ] {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), content, |b, content| {
            b.iter(|| {
                let file = SourceFile::new("bench.rs", content.as_bytes());
                chunker.split(black_box(&file)).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_markdown_chunking(c: &mut Criterion) {
    let chunker = CodeChunker::new(ChunkingOptions::default()).unwrap();

    c.bench_function("markdown_chunking", |b| {
        b.iter(|| {
            let file = SourceFile::new("guide.md", MARKDOWN_DOC.as_bytes());
            chunker.split(black_box(&file)).unwrap()
        });
    });
}

fn bench_api_spec_chunking(c: &mut Criterion) {
    let chunker = CodeChunker::new(ChunkingOptions::default()).unwrap();
    let mut group = c.benchmark_group("api_spec_chunking");

    for paths in [5usize, 50] {
        let spec = generate_api_spec(paths);
        group.throughput(Throughput::Bytes(spec.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(paths), &spec, |b, spec| {
            b.iter(|| {
                let file = SourceFile::new("openapi.json", spec.as_bytes());
                chunker.split(black_box(&file)).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_sliding_window(c: &mut Criterion) {
    let chunker = CodeChunker::new(ChunkingOptions::default()).unwrap();
    let oversized = generate_oversized_function(800);

    let mut group = c.benchmark_group("sliding_window");
    group.sample_size(30);
    group.throughput(Throughput::Bytes(oversized.len() as u64));
    group.bench_function("oversized_function", |b| {
        b.iter(|| {
            let file = SourceFile::new("huge.rs", oversized.as_bytes());
            chunker.split(black_box(&file)).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_token_counting,
    bench_code_chunking,
    bench_markdown_chunking,
    bench_api_spec_chunking,
    bench_sliding_window,
);
criterion_main!(benches);
