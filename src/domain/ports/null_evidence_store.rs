//! Null evidence store, used when retrieval is disabled.

use async_trait::async_trait;

use super::evidence_store::{EvidenceError, EvidenceFilter, EvidenceStore, StoredChunk};

/// A store that never has evidence.
#[derive(Debug, Clone, Default)]
pub struct NullEvidenceStore;

impl NullEvidenceStore {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EvidenceStore for NullEvidenceStore {
    fn name(&self) -> &str {
        "null"
    }

    async fn query(
        &self,
        _text: &str,
        _filter: Option<&EvidenceFilter>,
        _top_k: usize,
    ) -> Result<Vec<StoredChunk>, EvidenceError> {
        Ok(Vec::new())
    }
}
