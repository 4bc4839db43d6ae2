//! Language detection from file paths

use std::path::Path;

/// AST node kinds emitted as chunks, per language
const RUST_CHUNK_NODES: &[&str] = &[
    "function_item",
    "impl_item",
    "struct_item",
    "enum_item",
    "trait_item",
    "mod_item",
    "type_item",
    "const_item",
    "static_item",
    "macro_definition",
];

const PYTHON_CHUNK_NODES: &[&str] = &[
    "function_definition",
    "class_definition",
    "decorated_definition",
];

const JS_CHUNK_NODES: &[&str] = &[
    "function_declaration",
    "class_declaration",
    "method_definition",
    "arrow_function",
    "function_expression",
    "export_statement",
    "interface_declaration",
    "type_alias_declaration",
    "enum_declaration",
];

const GO_CHUNK_NODES: &[&str] = &[
    "function_declaration",
    "method_declaration",
    "type_declaration",
    "const_declaration",
    "var_declaration",
];

/// Supported programming languages for AST chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    TypeScriptTsx,
    Go,
}

impl Language {
    /// All supported languages, in display order
    pub const ALL: [Language; 6] = [
        Self::Rust,
        Self::Python,
        Self::JavaScript,
        Self::TypeScript,
        Self::TypeScriptTsx,
        Self::Go,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::TypeScriptTsx => "tsx",
            Self::Go => "go",
        }
    }

    /// File extensions mapped to this language
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["rs"],
            Self::Python => &["py", "pyi"],
            Self::JavaScript => &["js", "mjs", "cjs", "jsx"],
            Self::TypeScript => &["ts", "mts", "cts"],
            Self::TypeScriptTsx => &["tsx"],
            Self::Go => &["go"],
        }
    }

    /// Detect language from file path extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::from_extension(ext)
    }

    /// Detect language from file extension string
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::TypeScriptTsx),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    /// AST node kinds that become chunks for this language
    pub fn chunk_node_kinds(&self) -> &'static [&'static str] {
        match self {
            Self::Rust => RUST_CHUNK_NODES,
            Self::Python => PYTHON_CHUNK_NODES,
            Self::JavaScript | Self::TypeScript | Self::TypeScriptTsx => JS_CHUNK_NODES,
            Self::Go => GO_CHUNK_NODES,
        }
    }
}

/// Check if a file path is supported for AST chunking
pub fn is_supported(path: &Path) -> bool {
    Language::from_path(path).is_some()
}

/// Check if a file path is a markdown document
pub fn is_markdown(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown")
}

/// Check if a file path may hold an OpenAPI/Swagger JSON document
pub fn is_api_spec_candidate(path: &str) -> bool {
    path.to_lowercase().ends_with(".json")
}
