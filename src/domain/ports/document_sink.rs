//! Document sink port.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for the serialized catalog. Each write replaces the whole
/// document and must never leave a partially written target behind.
pub trait DocumentSink: Send + Sync {
    /// Human-readable target description for logs and reports.
    fn target(&self) -> String;

    fn write(&self, text: &str) -> Result<(), SinkError>;
}
