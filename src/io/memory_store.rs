use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::io::store::{DocPath, DocumentStore, StoreError};

/// Ephemeral document store kept in a map, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<DocPath, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`delete` fail with `Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Synchronous peek at one document
    pub fn document(&self, path: &DocPath) -> Option<Value> {
        self.docs().get(path).cloned()
    }

    /// Paths of every stored document
    pub fn paths(&self) -> Vec<DocPath> {
        self.docs().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.docs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs().is_empty()
    }

    fn docs(&self) -> MutexGuard<'_, BTreeMap<DocPath, Value>> {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, path: &DocPath) -> Result<(), StoreError> {
        path.validate()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("write to {path} refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        path.validate()?;
        Ok(self.document(path))
    }

    async fn set(&self, path: &DocPath, value: Value) -> Result<(), StoreError> {
        self.check_writable(path)?;
        self.docs().insert(path.clone(), value);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.check_writable(path)?;
        self.docs().remove(path);
        Ok(())
    }

    async fn list(&self, collection: &DocPath) -> Result<Vec<Value>, StoreError> {
        collection.validate()?;
        Ok(self
            .docs()
            .iter()
            .filter(|(path, _)| path.parent().as_ref() == Some(collection))
            .map(|(_, value)| value.clone())
            .collect())
    }
}
