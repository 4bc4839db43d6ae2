//! HTTP embedder for OpenAI-compatible embedding endpoints

use super::{EmbeddedChunk, Embedder};
use crate::chunk::Chunk;
use crate::config::EmbeddingConfig;
use crate::error::{Result, SemIndexError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for vLLM / OpenAI-compatible `/v1/embeddings` services
pub struct HttpEmbedder {
    http_client: reqwest::Client,
    config: EmbeddingConfig,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SemIndexError::Http)?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(EmbeddingConfig::default())
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct EmbedRequest {
            model: String,
            input: Vec<String>,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
        }

        let request = EmbedRequest {
            model: self.config.model.clone(),
            input: texts,
        };

        let url = format!("{}/v1/embeddings", self.config.url);
        debug!(url = %url, batch = request.input.len(), "requesting embeddings");

        let mut req = self.http_client.post(&url).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SemIndexError::ExternalError(format!(
                "Embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response.json().await?;
        Ok(embed_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<EmbeddedChunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embed_texts(texts).await?;
        if vectors.len() != chunks.len() {
            return Err(SemIndexError::Embedding(format!(
                "embedding count mismatch: sent {} inputs, got {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        Ok(chunks
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let text = if self.config.strip_new_lines {
            text.replace('\n', " ")
        } else {
            text.to_string()
        };
        let vectors = self.embed_texts(vec![text]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| SemIndexError::Embedding("embedding service returned no vectors".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
