//! Document collaborator: turns a path into a parsed JSON document.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ReadError;

/// Source of parsed Tiled documents (maps and external tilesets).
///
/// The decoder never touches the filesystem directly; every file it follows
/// goes through this trait, which keeps the decode functions usable with
/// in-memory documents.
pub trait DocumentReader {
    fn read_document(&mut self, path: &Path) -> Result<Value, ReadError>;
}

impl<R: DocumentReader + ?Sized> DocumentReader for &mut R {
    fn read_document(&mut self, path: &Path) -> Result<Value, ReadError> {
        (**self).read_document(path)
    }
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentReader;

impl DocumentReader for FsDocumentReader {
    fn read_document(&mut self, path: &Path) -> Result<Value, ReadError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Serves documents from memory, keyed by the exact path the decoder asks for.
///
/// Missing entries report [`std::io::ErrorKind::NotFound`], so they behave like
/// absent files.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocuments {
    documents: HashMap<PathBuf, String>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any previous text at the same path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> &mut Self {
        self.documents.insert(path.into(), text.into());
        self
    }

    pub fn with(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl DocumentReader for MemoryDocuments {
    fn read_document(&mut self, path: &Path) -> Result<Value, ReadError> {
        let text = self.documents.get(path).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no document at {}", path.display()),
            )
        })?;
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_documents_parse_on_read() {
        let mut docs = MemoryDocuments::new().with("a.json", r#"{"width": 3}"#);
        let doc = docs.read_document(Path::new("a.json")).unwrap();
        assert_eq!(doc["width"], 3);
    }

    #[test]
    fn memory_documents_report_missing_as_io() {
        let mut docs = MemoryDocuments::new();
        let err = docs.read_document(Path::new("missing.json")).unwrap_err();
        assert!(matches!(err, ReadError::Io(e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn memory_documents_report_bad_json_as_parse() {
        let mut docs = MemoryDocuments::new().with("bad.json", "{ not json");
        let err = docs.read_document(Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, ReadError::Parse(_)));
    }

    #[test]
    fn fs_reader_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(&path, r#"{"layers": []}"#).unwrap();

        let doc = FsDocumentReader.read_document(&path).unwrap();
        assert!(doc["layers"].as_array().unwrap().is_empty());
    }
}
