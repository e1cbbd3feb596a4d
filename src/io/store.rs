use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

/// Error type for document store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid document path: {0}")]
    InvalidPath(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Slash-separated location of a document or collection, e.g.
/// `users/ada/taskList/3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(Vec<String>);

impl DocPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DocPath(segments.into_iter().map(Into::into).collect())
    }

    /// Path one level below this one
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        DocPath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The collection this document lives in
    pub fn parent(&self) -> Option<DocPath> {
        let (_, parent) = self.0.split_last()?;
        Some(DocPath(parent.to_vec()))
    }

    /// Reject empty segments, separators, and relative components.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.0.is_empty() {
            return Err(StoreError::InvalidPath("empty path".into()));
        }
        for seg in &self.0 {
            if !is_valid_segment(seg) {
                return Err(StoreError::InvalidPath(self.to_string()));
            }
        }
        Ok(())
    }
}

/// A single path component usable both as a document key and a file name
pub fn is_valid_segment(seg: &str) -> bool {
    !seg.is_empty()
        && seg != "."
        && seg != ".."
        && !seg.contains(['/', '\\', '\0'])
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// A remote key→JSON document store organized in collections.
///
/// Writes are whole-document replacements (last write wins).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document. `Ok(None)` when it does not exist.
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError>;

    /// Create or replace one document.
    async fn set(&self, path: &DocPath, value: Value) -> Result<(), StoreError>;

    /// Delete one document. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;

    /// All readable documents directly inside `collection`, ordered by
    /// document key. Unreadable documents are skipped.
    async fn list(&self, collection: &DocPath) -> Result<Vec<Value>, StoreError>;
}
