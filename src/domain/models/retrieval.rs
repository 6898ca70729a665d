//! Evidence returned by the retrieval combiner.

use std::fmt;

use serde::Serialize;

/// Which store a piece of evidence came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "store", content = "project", rename_all = "snake_case")]
pub enum SourceLabel {
    /// Project-scoped store, with the filter value that selected it.
    Project(String),
    Global,
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "[Project {id}]"),
            Self::Global => f.write_str("[Knowledge base]"),
        }
    }
}

/// One chunk of evidence. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub source_label: SourceLabel,
    pub document_name: String,
    pub chunk_text: String,
    pub relevance_score: f32,
}

impl RetrievalResult {
    pub fn is_project(&self) -> bool {
        matches!(self.source_label, SourceLabel::Project(_))
    }
}
