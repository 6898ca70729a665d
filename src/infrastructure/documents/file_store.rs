//! Catalog files on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::domain::models::LineEnding;
use crate::domain::ports::{DocumentSink, SinkError};

/// Replaces the target file atomically: the text goes to a temporary file in
/// the same directory, which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileDocumentSink {
    path: PathBuf,
}

impl FileDocumentSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentSink for FileDocumentSink {
    fn target(&self) -> String {
        self.path.display().to_string()
    }

    fn write(&self, text: &str) -> Result<(), SinkError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        file.write_all(text.as_bytes()).map_err(|e| self.io_error(e))?;
        if !text.ends_with('\n') {
            let ending = LineEnding::detect(text).as_str();
            file.write_all(ending.as_bytes()).map_err(|e| self.io_error(e))?;
        }
        file.as_file().sync_all().map_err(|e| self.io_error(e))?;
        file.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

/// Read a catalog, failing with the path in the message.
pub fn read_document(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("Failed to read catalog {}", path.display()))
}
