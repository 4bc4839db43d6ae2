//! AST-aware chunking engine
//!
//! Splits source files into token-bounded chunks: code files through a
//! tree-sitter AST walk, markdown through heading/fence scanning, and
//! OpenAPI/Swagger JSON documents per path entry. Oversized spans are
//! delegated to a sliding-window splitter.

pub mod api_spec;
pub mod language;
pub mod markdown;
pub mod parser;
pub mod tokens;
pub mod types;
pub mod window;

pub use api_spec::{split_api_spec, validate_api_spec, ApiVersion};
pub use language::{is_supported, Language};
pub use tokens::TokenCounter;
pub use types::{Chunk, ChunkingOptions, SourceFile};

use crate::error::{Result, SemIndexError};
use std::path::Path;
use tracing::debug;

/// Language tag carried by AST-derived code chunks
pub const CODE_LANGUAGE: &str = "code";
/// Language tag carried by markdown chunks
pub const MARKDOWN_LANGUAGE: &str = "markdown";
/// Language tag carried by API-spec chunks
pub const DOC_LANGUAGE: &str = "doc";

/// Main chunker, routing files to the AST, markdown or API-spec splitter
pub struct CodeChunker {
    tokens: TokenCounter,
    options: ChunkingOptions,
}

impl CodeChunker {
    pub fn new(options: ChunkingOptions) -> Result<Self> {
        Ok(Self {
            tokens: TokenCounter::new()?,
            options,
        })
    }

    pub fn options(&self) -> &ChunkingOptions {
        &self.options
    }

    pub fn token_counter(&self) -> &TokenCounter {
        &self.tokens
    }

    /// Split one file into chunks, selecting the splitter by extension.
    ///
    /// Markdown and API-spec routing respect the corresponding option
    /// flags; files with no resolvable language fail as unsupported.
    pub fn split(&self, file: &SourceFile) -> Result<Vec<Chunk>> {
        if language::is_markdown(&file.path) {
            if !self.options.enable_markdown_parsing {
                return Err(SemIndexError::UnsupportedFile(format!(
                    "{}: markdown parsing is disabled",
                    file.path
                )));
            }
            return markdown::split_markdown(&self.tokens, file, &self.options);
        }

        if language::is_api_spec_candidate(&file.path) {
            if !self.options.enable_api_spec_parsing {
                return Err(SemIndexError::UnsupportedFile(format!(
                    "{}: API spec parsing is disabled",
                    file.path
                )));
            }
            return api_spec::split_api_spec(&self.tokens, file);
        }

        let lang = Language::from_path(Path::new(&file.path))
            .ok_or_else(|| SemIndexError::UnsupportedFile(file.path.clone()))?;
        self.split_code(file, lang)
    }

    /// Walk the AST and emit one chunk per matched node kind.
    ///
    /// A matched node's subtree is skipped, so nested definitions stay
    /// inside their parent's chunk.
    fn split_code(&self, file: &SourceFile, lang: Language) -> Result<Vec<Chunk>> {
        let tree = parser::parse(&file.content, lang)?;
        let node_kinds = lang.chunk_node_kinds();

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut cursor = tree.root_node().walk();

        'walk: loop {
            let node = cursor.node();
            if node_kinds.contains(&node.kind()) {
                let start = node.start_position();
                let end = node.end_position();
                let text = String::from_utf8_lossy(&file.content[node.start_byte()..node.end_byte()]);
                let token_count = self.tokens.count(&text);

                if token_count > self.options.max_tokens_per_chunk {
                    chunks.extend(window::split_window(
                        &self.tokens,
                        &text,
                        file,
                        &self.options,
                        start.row,
                        CODE_LANGUAGE,
                    ));
                } else {
                    chunks.push(Chunk {
                        codebase_id: file.codebase_id,
                        codebase_path: file.codebase_path.clone(),
                        codebase_name: file.codebase_name.clone(),
                        language: CODE_LANGUAGE.to_string(),
                        content: text.into_owned(),
                        file_path: file.path.clone(),
                        range: [start.row, start.column, end.row, end.column],
                        token_count,
                    });
                }

                // skip the subtree, continue at the next sibling
                if !cursor.goto_next_sibling() {
                    loop {
                        if !cursor.goto_parent() {
                            break 'walk;
                        }
                        if cursor.goto_next_sibling() {
                            break;
                        }
                    }
                }
                continue;
            }

            if cursor.goto_first_child() {
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }

        debug!(
            path = %file.path,
            language = %lang.as_str(),
            chunks = chunks.len(),
            "split code file"
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn chunker() -> &'static CodeChunker {
        static CHUNKER: OnceLock<CodeChunker> = OnceLock::new();
        CHUNKER.get_or_init(|| CodeChunker::new(ChunkingOptions::default()).unwrap())
    }

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            codebase_id: 1,
            codebase_path: "/repo".to_string(),
            codebase_name: "repo".to_string(),
            path: path.to_string(),
            content: content.as_bytes().to_vec(),
            language: None,
        }
    }

    #[test]
    fn test_rust_function_exact_range() {
        let src = "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}";
        let chunks = chunker().split(&file("src/math.rs", src)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, src);
        assert_eq!(chunks[0].range, [0, 0, 2, 1]);
        assert_eq!(chunks[0].language, "code");
        assert!(chunks[0].token_count > 0);
    }

    #[test]
    fn test_rust_items_in_document_order() {
        let src = "fn hello() {\n    println!(\"hi\");\n}\n\nstruct Point {\n    x: i32,\n    y: i32,\n}\n";
        let chunks = chunker().split(&file("src/lib.rs", src)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("fn hello"));
        assert!(chunks[1].content.starts_with("struct Point"));
        assert!(chunks[0].range[0] <= chunks[1].range[0]);
    }

    #[test]
    fn test_impl_block_not_split_into_methods() {
        let src = "struct S;\n\nimpl S {\n    fn a(&self) {}\n    fn b(&self) {}\n}\n";
        let chunks = chunker().split(&file("src/s.rs", src)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].content.contains("fn a"));
        assert!(chunks[1].content.contains("fn b"));
    }

    #[test]
    fn test_python_defs_and_classes() {
        let src = "def greet(name):\n    print(name)\n\nclass Greeter:\n    def __init__(self):\n        pass\n";
        let chunks = chunker().split(&file("app/main.py", src)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("def greet"));
        assert!(chunks[1].content.starts_with("class Greeter"));
    }

    #[test]
    fn test_typescript_interface() {
        let src = "interface Shape {\n  area(): number;\n}\n\nfunction describe(s: Shape): string {\n  return `${s.area()}`;\n}\n";
        let chunks = chunker().split(&file("web/shapes.ts", src)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("interface Shape"));
        assert!(chunks[1].content.starts_with("function describe"));
    }

    #[test]
    fn test_go_declarations() {
        let src = "package main\n\nfunc main() {\n\tprintln(\"hi\")\n}\n\ntype Pair struct {\n\tA, B int\n}\n";
        let chunks = chunker().split(&file("cmd/main.go", src)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("func main"));
        assert!(chunks[1].content.starts_with("type Pair"));
    }

    #[test]
    fn test_unsupported_extension_is_ignorable() {
        let err = chunker().split(&file("data.bin", "xxxx")).unwrap_err();
        assert!(err.is_ignorable());

        let err = chunker().split(&file("Makefile", "all:\n\ttrue\n")).unwrap_err();
        assert!(err.is_ignorable());
    }

    #[test]
    fn test_markdown_routing() {
        let chunks = chunker()
            .split(&file("README.md", "# Title\n\nSome text.\n"))
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].language, "markdown");

        let disabled = CodeChunker::new(ChunkingOptions {
            enable_markdown_parsing: false,
            ..Default::default()
        })
        .unwrap();
        let err = disabled
            .split(&file("README.md", "# Title\n"))
            .unwrap_err();
        assert!(err.is_ignorable());
    }

    #[test]
    fn test_api_spec_routing() {
        let spec = r#"{"openapi": "3.0.0", "info": {"title": "T", "version": "1"}, "paths": {"/a": {"get": {}}}}"#;
        let chunks = chunker().split(&file("api.json", spec)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].language, "doc");

        let err = chunker().split(&file("broken.json", "{nope")).unwrap_err();
        assert!(err.is_ignorable());

        let disabled = CodeChunker::new(ChunkingOptions {
            enable_api_spec_parsing: false,
            ..Default::default()
        })
        .unwrap();
        let err = disabled.split(&file("api.json", spec)).unwrap_err();
        assert!(err.is_ignorable());
    }

    #[test]
    fn test_oversized_function_window_split() {
        let mut src = String::from("fn big() {\n");
        for i in 0..200 {
            src.push_str(&format!("    let v{i} = {i} + {i};\n"));
        }
        src.push_str("}\n");

        let small = CodeChunker::new(ChunkingOptions {
            max_tokens_per_chunk: 64,
            sliding_window_overlap_tokens: 16,
            ..Default::default()
        })
        .unwrap();
        let chunks = small.split(&file("src/big.rs", &src)).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= 64);
            assert_eq!(chunk.language, "code");
        }
    }
}
