//! Port trait definitions (Hexagonal Architecture)
//!
//! Infrastructure adapters implement these traits:
//! - `GenerationProvider`: language-generation backends
//! - `EvidenceStore` / `QueryEmbedder`: semantic search over project and global evidence
//! - `DocumentSink`: atomic catalog persistence

pub mod document_sink;
pub mod evidence_store;
pub mod generation;
pub mod null_evidence_store;

pub use document_sink::{DocumentSink, SinkError};
pub use evidence_store::{EvidenceError, EvidenceFilter, EvidenceStore, QueryEmbedder, StoredChunk};
pub use generation::{GenerationError, GenerationProvider, GenerationRequest};
pub use null_evidence_store::NullEvidenceStore;
