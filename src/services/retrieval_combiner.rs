//! Project plus global evidence lookup.
//!
//! The global store is always queried. The project store is queried only when a
//! project filter is active. Results are concatenated, project first, and never
//! re-ranked across stores.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::models::{RetrievalResult, SourceLabel};
use crate::domain::ports::{EvidenceError, EvidenceFilter, EvidenceStore, StoredChunk};

pub const NO_EVIDENCE: &str = "No matching evidence found.";

#[derive(Clone)]
pub struct RetrievalCombiner {
    project_store: Arc<dyn EvidenceStore>,
    global_store: Arc<dyn EvidenceStore>,
    project_top_k: usize,
    global_top_k: usize,
}

impl std::fmt::Debug for RetrievalCombiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalCombiner")
            .field("project_store", &self.project_store.name())
            .field("global_store", &self.global_store.name())
            .field("project_top_k", &self.project_top_k)
            .field("global_top_k", &self.global_top_k)
            .finish()
    }
}

impl RetrievalCombiner {
    pub fn new(project_store: Arc<dyn EvidenceStore>, global_store: Arc<dyn EvidenceStore>) -> Self {
        Self {
            project_store,
            global_store,
            project_top_k: 5,
            global_top_k: 3,
        }
    }

    #[must_use]
    pub const fn with_top_k(mut self, project_top_k: usize, global_top_k: usize) -> Self {
        self.project_top_k = project_top_k;
        self.global_top_k = global_top_k;
        self
    }

    /// Query both stores and merge. A failing store contributes nothing.
    pub async fn retrieve(&self, query: &str, project_filter: Option<&str>) -> Vec<RetrievalResult> {
        let filter = project_filter
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(EvidenceFilter::project);

        let project_query = async {
            match &filter {
                Some(filter) => Some(
                    self.project_store
                        .query(query, Some(filter), self.project_top_k)
                        .await,
                ),
                None => None,
            }
        };
        let global_query = self.global_store.query(query, None, self.global_top_k);

        let (project, global) = tokio::join!(project_query, global_query);

        let mut results = Vec::new();
        if let (Some(outcome), Some(filter)) = (project, &filter) {
            let label = SourceLabel::Project(filter.project_id.clone());
            results.extend(label_chunks(
                self.project_store.name(),
                outcome,
                &label,
                self.project_top_k,
            ));
        }
        results.extend(label_chunks(
            self.global_store.name(),
            global,
            &SourceLabel::Global,
            self.global_top_k,
        ));

        debug!(
            results = results.len(),
            project = ?filter.as_ref().map(|f| &f.project_id),
            "retrieved evidence"
        );
        results
    }
}

fn label_chunks(
    store: &str,
    outcome: Result<Vec<StoredChunk>, EvidenceError>,
    label: &SourceLabel,
    top_k: usize,
) -> Vec<RetrievalResult> {
    match outcome {
        Ok(chunks) => chunks
            .into_iter()
            .take(top_k)
            .map(|chunk| RetrievalResult {
                source_label: label.clone(),
                document_name: chunk.document_name,
                chunk_text: chunk.text,
                relevance_score: chunk.score,
            })
            .collect(),
        Err(err) => {
            warn!(store, error = %err, "evidence store query failed; continuing without it");
            Vec::new()
        }
    }
}

/// Number and label every result for the generation input.
pub fn format_evidence(results: &[RetrievalResult]) -> String {
    if results.is_empty() {
        return NO_EVIDENCE.to_string();
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "[{}] {} {}\n{}",
            i + 1,
            result.source_label,
            result.document_name,
            result.chunk_text.trim()
        );
    }
    out.trim_end().to_string()
}
