//! Chroma collections over its REST API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::domain::ports::{EvidenceError, EvidenceFilter, EvidenceStore, QueryEmbedder, StoredChunk};

const DOCUMENT_NAME_KEYS: [&str; 3] = ["source_file", "source", "file_name"];

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    where_clause: Option<Value>,
    include: [&'static str; 3],
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<HashMap<String, Value>>>>,
    #[serde(default)]
    distances: Vec<Vec<Option<f32>>>,
}

/// One Chroma collection. The collection id is looked up once, on first query.
pub struct ChromaStore {
    client: ReqwestClient,
    base_url: String,
    collection: String,
    filter_field: String,
    max_chunk_chars: usize,
    embedder: Arc<dyn QueryEmbedder>,
    collection_id: OnceCell<String>,
}

impl std::fmt::Debug for ChromaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromaStore")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl ChromaStore {
    pub fn new(
        client: ReqwestClient,
        base_url: impl Into<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn QueryEmbedder>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            filter_field: "project_id".to_string(),
            max_chunk_chars: 500,
            embedder,
            collection_id: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_filter_field(mut self, field: impl Into<String>) -> Self {
        self.filter_field = field.into();
        self
    }

    #[must_use]
    pub const fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    async fn collection_id(&self) -> Result<&str, EvidenceError> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .get(format!("{}/api/v1/collections/{}", self.base_url, self.collection))
                    .send()
                    .await
                    .map_err(|e| EvidenceError::Unavailable(e.to_string()))?;

                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Err(EvidenceError::CollectionNotFound(self.collection.clone()));
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    // Chroma answers a missing collection with 500 + "does not exist".
                    if body.contains("does not exist") {
                        return Err(EvidenceError::CollectionNotFound(self.collection.clone()));
                    }
                    return Err(EvidenceError::Unavailable(format!(
                        "{}: {}",
                        status.as_u16(),
                        body.trim()
                    )));
                }

                let info: CollectionInfo = response
                    .json()
                    .await
                    .map_err(|e| EvidenceError::InvalidResponse(e.to_string()))?;
                debug!(collection = %self.collection, id = %info.id, "resolved collection");
                Ok::<_, EvidenceError>(info.id)
            })
            .await?;
        Ok(id.as_str())
    }

    fn where_clause(&self, filter: &EvidenceFilter) -> Value {
        let value = filter
            .project_id
            .trim()
            .parse::<i64>()
            .map_or_else(|_| json!(filter.project_id), |n| json!(n));
        let mut clause = serde_json::Map::new();
        clause.insert(self.filter_field.clone(), value);
        Value::Object(clause)
    }
}

#[async_trait]
impl EvidenceStore for ChromaStore {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn query(
        &self,
        text: &str,
        filter: Option<&EvidenceFilter>,
        top_k: usize,
    ) -> Result<Vec<StoredChunk>, EvidenceError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let id = self.collection_id().await?;
        let embedding = self.embedder.embed(text).await?;

        let request = QueryRequest {
            query_embeddings: vec![embedding],
            n_results: top_k,
            where_clause: filter.map(|f| self.where_clause(f)),
            include: ["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(format!("{}/api/v1/collections/{id}/query", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| EvidenceError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvidenceError::Unavailable(format!(
                "query returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| EvidenceError::InvalidResponse(e.to_string()))?;

        Ok(chunks_from_response(parsed, self.max_chunk_chars, top_k))
    }
}

fn chunks_from_response(response: QueryResponse, max_chunk_chars: usize, top_k: usize) -> Vec<StoredChunk> {
    let documents = response.documents.into_iter().next().unwrap_or_default();
    let metadatas = response.metadatas.into_iter().next().unwrap_or_default();
    let distances = response.distances.into_iter().next().unwrap_or_default();

    documents
        .into_iter()
        .enumerate()
        .filter_map(|(i, doc)| {
            let text = doc?;
            let document_name = metadatas
                .get(i)
                .and_then(Option::as_ref)
                .and_then(document_name)
                .unwrap_or_else(|| "unknown".to_string());
            let score = distances
                .get(i)
                .copied()
                .flatten()
                .map_or(0.0, |d| 1.0 / (1.0 + d.max(0.0)));
            Some(StoredChunk {
                document_name,
                text: truncate_chars(&text, max_chunk_chars),
                score,
            })
        })
        .take(top_k)
        .collect()
}

fn document_name(metadata: &HashMap<String, Value>) -> Option<String> {
    DOCUMENT_NAME_KEYS
        .iter()
        .find_map(|key| metadata.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Cut at a char boundary, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_mapping() {
        let response: QueryResponse = serde_json::from_value(json!({
            "ids": [["a", "b"]],
            "documents": [["First chunk", "Second chunk"]],
            "metadatas": [[{"source_file": "handbook.md"}, null]],
            "distances": [[0.0, 1.0]]
        }))
        .unwrap();

        let chunks = chunks_from_response(response, 500, 5);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].document_name, "handbook.md");
        assert!((chunks[0].score - 1.0).abs() < f32::EPSILON);
        assert_eq!(chunks[1].document_name, "unknown");
        assert!((chunks[1].score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_response() {
        let chunks = chunks_from_response(QueryResponse::default(), 500, 5);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("ééééé", 3), "ééé...");
    }
}
