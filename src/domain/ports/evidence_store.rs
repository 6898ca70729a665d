//! Evidence store port.
//!
//! Stores are opaque semantic-search backends. The core only needs a top-K
//! query with an optional project filter.

use async_trait::async_trait;
use thiserror::Error;

/// Narrows a query to one project's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFilter {
    pub project_id: String,
}

impl EvidenceFilter {
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }
}

/// A chunk as returned by a store, before it is labelled with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub document_name: String,
    pub text: String,
    /// Higher is more relevant.
    pub score: f32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvidenceError {
    #[error("Evidence store unavailable: {0}")]
    Unavailable(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Invalid evidence store response: {0}")]
    InvalidResponse(String),
}

/// Port for semantic-search backends.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    fn name(&self) -> &str;

    /// Return at most `top_k` chunks, best first. An empty result is valid.
    async fn query(
        &self,
        text: &str,
        filter: Option<&EvidenceFilter>,
        top_k: usize,
    ) -> Result<Vec<StoredChunk>, EvidenceError>;
}

/// Turns query text into the vector the store searches with.
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EvidenceError>;
}
