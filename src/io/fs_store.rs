use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::io::store::{DocPath, DocumentStore, StoreError};

/// Document store backed by a directory tree: one pretty-printed JSON file
/// per document at `<root>/<collection...>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the document at `path`
    pub fn document_file(&self, path: &DocPath) -> Result<PathBuf, StoreError> {
        path.validate()?;
        let mut file = self.root.clone();
        let (last, dirs) = path
            .segments()
            .split_last()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        for dir in dirs {
            file.push(dir);
        }
        file.push(format!("{last}.json"));
        Ok(file)
    }

    fn collection_dir(&self, path: &DocPath) -> Result<PathBuf, StoreError> {
        path.validate()?;
        let mut dir = self.root.clone();
        for seg in path.segments() {
            dir.push(seg);
        }
        Ok(dir)
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Run blocking file I/O off the runtime thread.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
}

fn read_document(file: &Path) -> Result<Option<Value>, StoreError> {
    match fs::read_to_string(file) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(file)(e)),
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let file = self.document_file(path)?;
        blocking(move || read_document(&file)).await
    }

    async fn set(&self, path: &DocPath, value: Value) -> Result<(), StoreError> {
        let file = self.document_file(path)?;
        let content = serde_json::to_vec_pretty(&value)?;
        blocking(move || atomic_write(&file, &content).map_err(io_error(&file))).await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let file = self.document_file(path)?;
        blocking(move || match fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&file)(e)),
        })
        .await
    }

    async fn list(&self, collection: &DocPath) -> Result<Vec<Value>, StoreError> {
        let dir = self.collection_dir(collection)?;
        blocking(move || {
            if !dir.is_dir() {
                return Ok(Vec::new());
            }
            let mut files = Vec::new();
            for entry in fs::read_dir(&dir).map_err(io_error(&dir))? {
                let path = entry.map_err(io_error(&dir))?.path();
                if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                    files.push(path);
                }
            }
            files.sort();

            let mut docs = Vec::with_capacity(files.len());
            for file in files {
                match read_document(&file) {
                    Ok(Some(doc)) => docs.push(doc),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(file = %file.display(), "skipping unreadable document: {e}"),
                }
            }
            Ok(docs)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(segments: &[&str]) -> DocPath {
        DocPath::new(segments.iter().copied())
    }

    #[tokio::test]
    async fn set_then_get() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let path = doc(&["users", "ada", "sort", "sortType"]);

        store.set(&path, json!({"sort": "DATE"})).await.unwrap();
        assert!(tmp.path().join("users/ada/sort/sortType.json").is_file());
        let back = store.get(&path).await.unwrap();
        assert_eq!(back, Some(json!({"sort": "DATE"})));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let got = store.get(&doc(&["users", "ada", "sort", "sortType"])).await;
        assert!(got.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_malformed_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let path = doc(&["users", "ada", "sort", "sortType"]);
        let file = store.document_file(&path).unwrap();
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "not json {{{").unwrap();
        assert!(matches!(
            store.get(&path).await,
            Err(StoreError::Json(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let path = doc(&["users", "ada", "taskList", "1"]);
        store.set(&path, json!({"id": 1})).await.unwrap();
        store.delete(&path).await.unwrap();
        store.delete(&path).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_reads_only_json_documents() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let coll = doc(&["users", "ada", "taskList"]);
        store.set(&coll.child("2"), json!({"id": 2})).await.unwrap();
        store.set(&coll.child("1"), json!({"id": 1})).await.unwrap();
        fs::write(tmp.path().join("users/ada/taskList/notes.txt"), "x").unwrap();

        let docs = store.list(&coll).await.unwrap();
        assert_eq!(docs, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[tokio::test]
    async fn list_skips_malformed_documents() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let coll = doc(&["users", "ada", "taskList"]);
        store.set(&coll.child("1"), json!({"id": 1})).await.unwrap();
        fs::write(tmp.path().join("users/ada/taskList/2.json"), "{ nope").unwrap();

        let docs = store.list(&coll).await.unwrap();
        assert_eq!(docs, vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn list_missing_collection_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let docs = store.list(&doc(&["users", "nobody", "taskList"])).await;
        assert!(docs.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let err = store
            .set(&doc(&["users", "..", "escape"]), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }
}
