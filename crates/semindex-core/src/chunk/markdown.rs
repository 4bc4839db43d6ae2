//! Markdown chunking by heading and fence structure

use super::tokens::TokenCounter;
use super::types::{Chunk, ChunkingOptions, SourceFile};
use super::window;
use super::MARKDOWN_LANGUAGE;
use crate::error::Result;

/// Split a markdown document into heading- and fence-delimited chunks.
///
/// Fenced code blocks flush as one chunk each, delimiters included; heading
/// lines start a fresh buffer; a buffer that grows past the token limit is
/// handed to the sliding-window splitter. Whitespace-only buffers are
/// dropped, so an empty document yields no chunks.
pub fn split_markdown(
    counter: &TokenCounter,
    file: &SourceFile,
    opts: &ChunkingOptions,
) -> Result<Vec<Chunk>> {
    let content = String::from_utf8_lossy(&file.content);
    let lines: Vec<&str> = content.split('\n').collect();

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut buffer = String::new();
    let mut current_line = 0usize;
    let mut in_code_block = false;

    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("```") {
            if in_code_block {
                buffer.push_str(line);
                buffer.push('\n');
                chunks.push(flush_chunk(
                    counter,
                    file,
                    &buffer,
                    [current_line, 0, i, line.len()],
                ));
                buffer.clear();
                in_code_block = false;
                current_line = i + 1;
            } else {
                if !buffer.trim().is_empty() {
                    chunks.push(flush_chunk(
                        counter,
                        file,
                        &buffer,
                        [current_line, 0, i - 1, lines[i - 1].len()],
                    ));
                }
                buffer.clear();
                buffer.push_str(line);
                buffer.push('\n');
                current_line = i;
                in_code_block = true;
            }
            continue;
        }

        if !in_code_block && line.starts_with('#') {
            if !buffer.trim().is_empty() {
                chunks.push(flush_chunk(
                    counter,
                    file,
                    &buffer,
                    [current_line, 0, i - 1, lines[i - 1].len()],
                ));
            }
            buffer.clear();
            buffer.push_str(line);
            buffer.push('\n');
            current_line = i;
            continue;
        }

        buffer.push_str(line);
        buffer.push('\n');

        if counter.count(&buffer) > opts.max_tokens_per_chunk {
            let sub = window::split_window(
                counter,
                &buffer,
                file,
                opts,
                current_line,
                MARKDOWN_LANGUAGE,
            );
            chunks.extend(sub);
            buffer.clear();
            current_line = i + 1;
        }
    }

    if !buffer.trim().is_empty() {
        let last = lines.len() - 1;
        chunks.push(flush_chunk(
            counter,
            file,
            &buffer,
            [current_line, 0, last, lines[last].len()],
        ));
    }

    Ok(chunks)
}

fn flush_chunk(
    counter: &TokenCounter,
    file: &SourceFile,
    content: &str,
    range: [usize; 4],
) -> Chunk {
    Chunk {
        codebase_id: file.codebase_id,
        codebase_path: file.codebase_path.clone(),
        codebase_name: file.codebase_name.clone(),
        language: MARKDOWN_LANGUAGE.to_string(),
        content: content.to_string(),
        file_path: file.path.clone(),
        range,
        token_count: counter.count(content),
    }
}
