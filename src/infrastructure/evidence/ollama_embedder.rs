use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{EvidenceError, QueryEmbedder};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Query embeddings from an Ollama embedding model.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: ReqwestClient,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: ReqwestClient, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl QueryEmbedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EvidenceError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| EvidenceError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvidenceError::Embedding(format!(
                "{} returned {}: {}",
                self.model,
                status.as_u16(),
                body.trim()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EvidenceError::Embedding(e.to_string()))?;
        if parsed.embedding.is_empty() {
            return Err(EvidenceError::Embedding(format!(
                "{} returned an empty embedding",
                self.model
            )));
        }
        Ok(parsed.embedding)
    }
}
