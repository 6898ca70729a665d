//! Evidence store adapters and their construction from configuration.

pub mod chroma;
pub mod ollama_embedder;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as ReqwestClient;
use tracing::info;

pub use chroma::ChromaStore;
pub use ollama_embedder::OllamaEmbedder;

use crate::domain::errors::ConfigurationError;
use crate::domain::models::{RetrievalBackend, RetrievalConfig};
use crate::domain::ports::{EvidenceStore, NullEvidenceStore, QueryEmbedder};
use crate::services::RetrievalCombiner;

const EVIDENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Project and global stores sharing one HTTP client and embedder.
pub fn build_retrieval(config: &RetrievalConfig) -> Result<RetrievalCombiner, ConfigurationError> {
    let combiner = match config.backend {
        RetrievalBackend::Disabled => {
            info!("retrieval disabled");
            RetrievalCombiner::new(Arc::new(NullEvidenceStore::new()), Arc::new(NullEvidenceStore::new()))
        }
        RetrievalBackend::Chroma => {
            let client = ReqwestClient::builder()
                .timeout(EVIDENCE_TIMEOUT)
                .build()
                .map_err(|e| ConfigurationError::EvidenceStoreInit(e.to_string()))?;

            let embedder: Arc<dyn QueryEmbedder> = Arc::new(OllamaEmbedder::new(
                client.clone(),
                &config.embedding.url,
                &config.embedding.model,
            ));

            let store = |collection: &str| -> Arc<dyn EvidenceStore> {
                Arc::new(
                    ChromaStore::new(client.clone(), &config.url, collection, embedder.clone())
                        .with_filter_field(&config.project_filter_field)
                        .with_max_chunk_chars(config.max_chunk_chars),
                )
            };

            info!(
                url = %config.url,
                project = %config.project_store.collection,
                global = %config.global_store.collection,
                "retrieval via chroma"
            );
            RetrievalCombiner::new(
                store(&config.project_store.collection),
                store(&config.global_store.collection),
            )
        }
    };

    Ok(combiner.with_top_k(config.project_top_k, config.global_top_k))
}
