//! Sliding-window splitting for oversized spans

use super::tokens::TokenCounter;
use super::types::{Chunk, ChunkingOptions, SourceFile};

/// Split `text` into overlapping token-bounded windows.
///
/// `base_line` is the zero-based line where `text` begins in its file.
/// Every window carries at most `max_tokens_per_chunk` tokens; the final
/// window is shifted backward to a full window instead of being emitted
/// undersized. Degenerate options or unsplittable text yield an empty Vec.
pub fn split_window(
    counter: &TokenCounter,
    text: &str,
    file: &SourceFile,
    opts: &ChunkingOptions,
    base_line: usize,
    language: &str,
) -> Vec<Chunk> {
    let max_tokens = opts.max_tokens_per_chunk;
    let overlap = opts.sliding_window_overlap_tokens;
    if max_tokens == 0 || overlap >= max_tokens {
        return Vec::new();
    }

    let offsets = match counter.token_byte_offsets(text) {
        Some(offsets) => offsets,
        None => return Vec::new(),
    };
    let total_tokens = offsets.len() - 1;
    if total_tokens == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::with_capacity(total_tokens.div_ceil(max_tokens));
    let mut start = 0usize;

    while start < total_tokens {
        let end = (start + max_tokens).min(total_tokens);
        let start_byte = offsets[start];
        let end_byte = offsets[end].min(text.len());
        let window = &text[start_byte..end_byte];

        let start_line = base_line + count_lines(&text[..start_byte]);
        let start_col = calculate_column(text, start_byte);
        let end_line = start_line + count_lines(window) - 1;
        let end_col = calculate_column(window, end_byte - start_byte - 1);

        chunks.push(Chunk {
            codebase_id: file.codebase_id,
            codebase_path: file.codebase_path.clone(),
            codebase_name: file.codebase_name.clone(),
            language: language.to_string(),
            content: window.to_string(),
            file_path: file.path.clone(),
            range: [start_line, start_col, end_line, end_col],
            token_count: end - start,
        });

        if end >= total_tokens {
            break;
        }

        // The last window is pulled back to a full window instead of
        // trailing undersized; all others advance by max - overlap.
        let remaining = total_tokens - end;
        start = if remaining < max_tokens {
            end.saturating_sub(max_tokens - remaining)
        } else {
            end.saturating_sub(overlap)
        };
    }

    chunks
}

/// Column of the byte at `byte_offset`, counting back to the previous newline
fn calculate_column(content: &str, byte_offset: usize) -> usize {
    let bytes = content.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let mut i = byte_offset.min(bytes.len() - 1);
    let mut column = 0;
    loop {
        if bytes[i] == b'\n' {
            break;
        }
        column += 1;
        if i == 0 {
            break;
        }
        i -= 1;
    }
    column
}

/// Line count of `s`, counting a trailing partial line as one line
fn count_lines(s: &str) -> usize {
    if s.is_empty() {
        return 0;
    }
    let mut count = s.bytes().filter(|&b| b == b'\n').count();
    if !s.ends_with('\n') {
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::OnceLock;

    fn counter() -> &'static TokenCounter {
        static COUNTER: OnceLock<TokenCounter> = OnceLock::new();
        COUNTER.get_or_init(|| TokenCounter::new().unwrap())
    }

    fn opts(max: usize, overlap: usize) -> ChunkingOptions {
        ChunkingOptions {
            max_tokens_per_chunk: max,
            sliding_window_overlap_tokens: overlap,
            ..Default::default()
        }
    }

    fn sample_file() -> SourceFile {
        SourceFile {
            codebase_id: 1,
            codebase_path: "/repo".to_string(),
            codebase_name: "repo".to_string(),
            path: "src/big.rs".to_string(),
            content: Vec::new(),
            language: None,
        }
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let chunks = split_window(counter(), "", &sample_file(), &opts(10, 2), 0, "code");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_invalid_overlap_yields_nothing() {
        let text = "fn a() {}\nfn b() {}\n";
        assert!(split_window(counter(), text, &sample_file(), &opts(10, 10), 0, "code").is_empty());
        assert!(split_window(counter(), text, &sample_file(), &opts(0, 0), 0, "code").is_empty());
    }

    #[test]
    fn test_single_window_keeps_whole_text() {
        let text = "fn main() {\n    println!(\"hi\");\n}\n";
        let chunks = split_window(counter(), text, &sample_file(), &opts(1000, 100), 0, "code");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].token_count, counter().count(text));
        assert_eq!(chunks[0].range[0], 0);
    }

    #[test]
    fn test_windows_respect_token_bound() {
        let mut text = String::new();
        for i in 0..80 {
            text.push_str(&format!("let value_{i} = {i} * {i};\n"));
        }
        let max = 50;
        let chunks = split_window(counter(), &text, &sample_file(), &opts(max, 10), 0, "code");

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= max);
        }
        // full windows throughout, including the shifted final one
        assert!(chunks.iter().all(|chunk| chunk.token_count == max));
    }

    #[test]
    fn test_base_line_offsets_ranges() {
        let text = "fn a() {}\nfn b() {}\n";
        let chunks = split_window(counter(), text, &sample_file(), &opts(1000, 100), 42, "code");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].range[0], 42);
        assert!(chunks[0].range[2] >= chunks[0].range[0]);
    }

    #[test]
    fn test_language_tag_passthrough() {
        let text = "some plain text that is long enough to split\n";
        let chunks = split_window(counter(), text, &sample_file(), &opts(1000, 10), 0, "markdown");
        assert!(chunks.iter().all(|chunk| chunk.language == "markdown"));
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\n"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\nb\n"), 2);
    }

    #[test]
    fn test_calculate_column() {
        assert_eq!(calculate_column("", 0), 0);
        assert_eq!(calculate_column("abc", 2), 3);
        assert_eq!(calculate_column("ab\ncd", 4), 2);
        assert_eq!(calculate_column("ab\ncd", 2), 0);
    }

    proptest! {
        #[test]
        fn prop_window_token_bound(
            text in "[ -~\n]{0,400}",
            max in 1usize..64,
            overlap in 0usize..64,
        ) {
            prop_assume!(overlap < max);
            let chunks = split_window(counter(), &text, &sample_file(), &opts(max, overlap), 0, "code");
            for chunk in &chunks {
                prop_assert!(chunk.token_count <= max);
                prop_assert!(!chunk.content.is_empty());
            }
        }
    }
}
