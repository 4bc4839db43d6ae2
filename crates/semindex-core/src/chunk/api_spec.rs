//! OpenAPI/Swagger chunking, one chunk per path entry

use super::tokens::TokenCounter;
use super::types::{Chunk, SourceFile};
use super::DOC_LANGUAGE;
use crate::error::{Result, SemIndexError};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref OPENAPI3_VERSION_RE: Regex = Regex::new(r"^3\.\d+(\.\d+)*$").unwrap();
}

/// Spec dialect detected from the document's version markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    OpenApi3,
    Swagger2,
}

/// Validate an OpenAPI/Swagger JSON document and detect its dialect.
///
/// Only JSON input is accepted; YAML specs fail as invalid.
pub fn validate_api_spec(text: &str) -> Result<ApiVersion> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| SemIndexError::InvalidApiSpec(format!("invalid JSON: {e}")))?;
    validate_root(&root)
}

/// Split an OpenAPI/Swagger JSON document into one chunk per `paths` entry.
///
/// Each chunk is a full document narrowed to a single path, with the title
/// suffixed by the path so chunks stay distinguishable after embedding.
/// An empty `paths` map yields zero chunks without error.
pub fn split_api_spec(counter: &TokenCounter, file: &SourceFile) -> Result<Vec<Chunk>> {
    let text = String::from_utf8_lossy(&file.content);
    let root: Value = serde_json::from_str(&text)
        .map_err(|e| SemIndexError::InvalidApiSpec(format!("{}: invalid JSON: {e}", file.path)))?;

    validate_root(&root)?;

    let paths = match root.get("paths").and_then(Value::as_object) {
        Some(paths) => paths,
        None => return Ok(Vec::new()),
    };

    let mut chunks = Vec::with_capacity(paths.len());
    for (path, item) in paths {
        let mut doc = root.clone();
        if let Some(obj) = doc.as_object_mut() {
            let mut single = Map::new();
            single.insert(path.clone(), item.clone());
            obj.insert("paths".to_string(), Value::Object(single));

            if let Some(Value::String(title)) = obj
                .get_mut("info")
                .and_then(Value::as_object_mut)
                .and_then(|info| info.get_mut("title"))
            {
                title.push_str(" - ");
                title.push_str(path);
            }
        }

        let serialized = serde_json::to_string(&doc)?;
        let token_count = counter.count(&serialized);
        chunks.push(Chunk {
            codebase_id: file.codebase_id,
            codebase_path: file.codebase_path.clone(),
            codebase_name: file.codebase_name.clone(),
            language: DOC_LANGUAGE.to_string(),
            content: serialized,
            file_path: file.path.clone(),
            range: [0, 0, 0, 0],
            token_count,
        });
    }

    Ok(chunks)
}

fn validate_root(root: &Value) -> Result<ApiVersion> {
    let obj = root
        .as_object()
        .ok_or_else(|| SemIndexError::InvalidApiSpec("document is not a JSON object".into()))?;

    let version = if let Some(swagger) = obj.get("swagger") {
        match swagger.as_str() {
            Some("2.0") => ApiVersion::Swagger2,
            other => {
                return Err(SemIndexError::InvalidApiSpec(format!(
                    "unsupported swagger version: {other:?}"
                )))
            }
        }
    } else if let Some(openapi) = obj.get("openapi") {
        match openapi.as_str() {
            Some(v) if OPENAPI3_VERSION_RE.is_match(v) => ApiVersion::OpenApi3,
            other => {
                return Err(SemIndexError::InvalidApiSpec(format!(
                    "unsupported openapi version: {other:?}"
                )))
            }
        }
    } else {
        return Err(SemIndexError::InvalidApiSpec(
            "missing openapi/swagger version field".into(),
        ));
    };

    let info = obj
        .get("info")
        .and_then(Value::as_object)
        .ok_or_else(|| SemIndexError::InvalidApiSpec("missing info object".into()))?;
    let title = info.get("title").and_then(Value::as_str).unwrap_or("");
    if title.trim().is_empty() {
        return Err(SemIndexError::InvalidApiSpec("empty info.title".into()));
    }
    let doc_version = info.get("version").and_then(Value::as_str).unwrap_or("");
    if doc_version.trim().is_empty() {
        return Err(SemIndexError::InvalidApiSpec("empty info.version".into()));
    }

    Ok(version)
}
