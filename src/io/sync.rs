//! Mirror of the board in the per-user document store.
//!
//! Writes are scheduled onto the tokio runtime and never awaited by the code
//! that triggered them; the in-memory board stays the source of truth for the
//! running session. Failed writes are logged and dropped. Scheduled writes
//! reach the store one at a time, in the order they were scheduled, so the
//! last write to a document wins. Scheduling a write requires a running tokio
//! runtime.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::io::documents::{self as docs, UserId};
use crate::io::store::{DocPath, DocumentStore};
use crate::model::task::{Task, TaskId};
use crate::model::taxonomy::{CategoryRegistry, ProgressRegistry, Taxonomy, TaxonomyKind};
use crate::model::view::{SortKind, SortSpec};

/// Everything read back at session start. `None` means the slice was absent
/// (or unreadable) and the caller should fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedState {
    /// Decoded tasks, ordered by id
    pub tasks: Vec<Task>,
    pub categories: Option<Vec<(String, String)>>,
    pub progress: Option<Vec<(String, String)>>,
    pub selected_categories: Option<Vec<String>>,
    pub selected_progress: Option<Vec<String>>,
    pub sort: Option<SortSpec>,
}

enum WriteOp {
    Set(Value),
    Delete,
}

struct Remote {
    store: Arc<dyn DocumentStore>,
    user: UserId,
    /// Most recently scheduled write; each write awaits its predecessor
    tail: Mutex<Option<JoinHandle<()>>>,
}

impl Remote {
    fn tail(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.tail.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the remote mirror. Cheap to clone; clones share pending writes.
///
/// A detached handle (signed out, or no store) loads nothing and drops every
/// write.
#[derive(Clone, Default)]
pub struct RemoteSync {
    remote: Option<Arc<Remote>>,
}

impl fmt::Debug for RemoteSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.remote {
            Some(remote) => f
                .debug_struct("RemoteSync")
                .field("user", &remote.user)
                .field("pending", &remote.tail().is_some())
                .finish(),
            None => f.write_str("RemoteSync(detached)"),
        }
    }
}

impl RemoteSync {
    /// Mirror into `store` for `user`. No user means signed out.
    pub fn new(store: Arc<dyn DocumentStore>, user: Option<UserId>) -> Self {
        let remote = user.map(|user| {
            Arc::new(Remote {
                store,
                user,
                tail: Mutex::new(None),
            })
        });
        RemoteSync { remote }
    }

    pub fn detached() -> Self {
        RemoteSync { remote: None }
    }

    pub fn is_attached(&self) -> bool {
        self.remote.is_some()
    }

    pub fn user(&self) -> Option<&UserId> {
        self.remote.as_ref().map(|r| &r.user)
    }

    /// Whether some scheduled write has not finished yet
    pub fn has_pending_writes(&self) -> bool {
        self.remote
            .as_ref()
            .is_some_and(|r| r.tail().as_ref().is_some_and(|h| !h.is_finished()))
    }

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------

    fn schedule(&self, path: DocPath, op: WriteOp) {
        let Some(remote) = &self.remote else {
            return;
        };
        let store = Arc::clone(&remote.store);
        tracing::debug!(doc = %path, delete = matches!(op, WriteOp::Delete), "scheduling remote write");
        let mut tail = remote.tail();
        let previous = tail.take();
        *tail = Some(tokio::spawn(async move {
            if let Some(previous) = previous
                && let Err(e) = previous.await
            {
                tracing::warn!("remote write task ended abnormally: {e}");
            }
            let result = match op {
                WriteOp::Set(value) => store.set(&path, value).await,
                WriteOp::Delete => store.delete(&path).await,
            };
            if let Err(e) = result {
                tracing::warn!(doc = %path, "remote write failed: {e}");
            }
        }));
    }

    fn write<T: Serialize>(&self, path: DocPath, doc: &T) {
        match serde_json::to_value(doc) {
            Ok(value) => self.schedule(path, WriteOp::Set(value)),
            Err(e) => tracing::warn!(doc = %path, "could not encode document: {e}"),
        }
    }

    fn user_path(&self, path: impl FnOnce(&UserId) -> DocPath) -> Option<DocPath> {
        self.remote.as_ref().map(|r| path(&r.user))
    }

    // -----------------------------------------------------------------------
    // Slices
    // -----------------------------------------------------------------------

    pub fn save_task(&self, task: &Task) {
        if let Some(path) = self.user_path(|u| docs::task_doc(u, task.id)) {
            self.write(path, &docs::TaskRecord::from(task));
        }
    }

    pub fn delete_task(&self, id: TaskId) {
        if let Some(path) = self.user_path(|u| docs::task_doc(u, id)) {
            self.schedule(path, WriteOp::Delete);
        }
    }

    pub fn save_categories(&self, categories: &CategoryRegistry) {
        if let Some(path) = self.user_path(docs::categories_doc) {
            self.write(path, &docs::CategoryListDoc::from(categories));
        }
    }

    pub fn save_progress(&self, progress: &ProgressRegistry) {
        if let Some(path) = self.user_path(docs::progress_doc) {
            self.write(path, &docs::ProgressListDoc::from(progress));
        }
    }

    /// Persist the selected categories, dropping keys no longer registered.
    pub fn save_selected_categories(&self, selected: &[String], live: &CategoryRegistry) {
        if let Some(path) = self.user_path(docs::selected_categories_doc) {
            let doc = docs::SelectedCategoriesDoc {
                category_list: live_keys(selected, live),
            };
            self.write(path, &doc);
        }
    }

    /// Persist the selected progress tags, dropping keys no longer registered.
    pub fn save_selected_progress(&self, selected: &[String], live: &ProgressRegistry) {
        if let Some(path) = self.user_path(docs::selected_progress_doc) {
            let doc = docs::SelectedProgressDoc {
                progress_list: live_keys(selected, live),
            };
            self.write(path, &doc);
        }
    }

    /// Sort kind and direction are two independent documents.
    pub fn save_sort(&self, sort: &SortSpec) {
        if let Some(path) = self.user_path(docs::sort_type_doc) {
            let doc = docs::SortTypeDoc {
                sort: sort.kind.as_str().to_string(),
            };
            self.write(path, &doc);
        }
        if let Some(path) = self.user_path(docs::ascending_doc) {
            let doc = docs::AscendingDoc {
                ascending: sort.ascending,
            };
            self.write(path, &doc);
        }
    }

    /// Wait for every write scheduled so far. Front ends call this before
    /// exiting; mutations never do.
    pub async fn flush(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        loop {
            let Some(last) = remote.tail().take() else {
                break;
            };
            if let Err(e) = last.await {
                tracing::warn!("remote write task ended abnormally: {e}");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Read the user's whole board. Unreadable pieces are logged and reported
    /// as absent; this never fails.
    pub async fn load(&self) -> LoadedState {
        let Some(remote) = &self.remote else {
            return LoadedState::default();
        };
        let store = remote.store.as_ref();
        let user = &remote.user;

        let tasks = load_tasks(store, user).await;

        let categories = read_doc::<docs::CategoryListDoc>(store, docs::categories_doc(user))
            .await
            .map(|doc| {
                doc.category_list
                    .into_iter()
                    .map(|e| (e.key, e.value))
                    .collect::<Vec<_>>()
            });
        let progress = read_doc::<docs::ProgressListDoc>(store, docs::progress_doc(user))
            .await
            .map(|doc| {
                doc.progress_list
                    .into_iter()
                    .map(|e| (e.name, e.color))
                    .collect::<Vec<_>>()
            });
        let selected_categories =
            read_doc::<docs::SelectedCategoriesDoc>(store, docs::selected_categories_doc(user))
                .await
                .map(|doc| doc.category_list);
        let selected_progress =
            read_doc::<docs::SelectedProgressDoc>(store, docs::selected_progress_doc(user))
                .await
                .map(|doc| doc.progress_list);

        let sort_type = read_doc::<docs::SortTypeDoc>(store, docs::sort_type_doc(user)).await;
        let ascending = read_doc::<docs::AscendingDoc>(store, docs::ascending_doc(user)).await;
        let sort = match (sort_type, ascending) {
            (Some(t), Some(a)) => Some(SortSpec::new(SortKind::parse(&t.sort), a.ascending)),
            _ => None,
        };

        tracing::debug!(
            user = %user,
            tasks = tasks.len(),
            categories = categories.is_some(),
            progress = progress.is_some(),
            sort = sort.is_some(),
            "loaded remote board"
        );

        LoadedState {
            tasks,
            categories,
            progress,
            selected_categories,
            selected_progress,
            sort,
        }
    }
}

fn live_keys<K: TaxonomyKind>(selected: &[String], live: &Taxonomy<K>) -> Vec<String> {
    selected
        .iter()
        .filter(|key| live.contains(key))
        .cloned()
        .collect()
}

async fn read_doc<T: DeserializeOwned>(store: &dyn DocumentStore, path: DocPath) -> Option<T> {
    match store.get(&path).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(doc = %path, "ignoring malformed document: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(doc = %path, "could not read document: {e}");
            None
        }
    }
}

async fn load_tasks(store: &dyn DocumentStore, user: &UserId) -> Vec<Task> {
    let collection = docs::task_collection(user);
    let values = match store.list(&collection).await {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(doc = %collection, "could not list tasks: {e}");
            return Vec::new();
        }
    };

    let mut tasks = Vec::with_capacity(values.len());
    for value in values {
        let record = match serde_json::from_value::<docs::TaskRecord>(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(doc = %collection, "skipping malformed task: {e}");
                continue;
            }
        };
        match record.into_task() {
            Ok(task) => tasks.push(task),
            Err(e) => tracing::warn!(doc = %collection, "skipping task: {e}"),
        }
    }
    tasks.sort_by_key(|t| t.id);
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory_store::MemoryStore;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ada() -> UserId {
        UserId::new("ada").unwrap()
    }

    fn attached() -> (Arc<MemoryStore>, RemoteSync) {
        let store = Arc::new(MemoryStore::new());
        let sync = RemoteSync::new(store.clone(), Some(ada()));
        (store, sync)
    }

    fn task(id: TaskId) -> Task {
        Task::new(
            id,
            format!("task {id}"),
            "Work",
            "Not Started",
            NaiveDate::from_ymd_opt(2024, 1, 15),
        )
    }

    #[tokio::test]
    async fn task_writes_land_after_flush() {
        let (store, sync) = attached();
        sync.save_task(&task(1));
        sync.save_task(&task(2));
        sync.delete_task(1);
        sync.flush().await;

        assert!(store.document(&docs::task_doc(&ada(), 1)).is_none());
        let stored = store.document(&docs::task_doc(&ada(), 2)).unwrap();
        assert_eq!(stored["name"], json!("task 2"));
        assert_eq!(stored["dateDue"], json!("2024-01-15T00:00:00.000Z"));
        assert!(!sync.has_pending_writes());
    }

    #[tokio::test]
    async fn signed_out_sync_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let sync = RemoteSync::new(store.clone(), None);
        assert!(!sync.is_attached());
        sync.save_task(&task(1));
        sync.save_sort(&SortSpec::default());
        sync.flush().await;
        assert!(store.is_empty());
        assert_eq!(sync.load().await, LoadedState::default());
    }

    #[tokio::test]
    async fn selection_writes_prune_stale_keys() {
        let (store, sync) = attached();
        let mut cats = CategoryRegistry::with_defaults();
        cats.delete("Finance").unwrap();
        let selected = vec!["Work".to_string(), "Finance".to_string(), "Ghost".to_string()];
        sync.save_selected_categories(&selected, &cats);
        sync.save_selected_progress(
            &["Completed".to_string(), "Stale".to_string()],
            &ProgressRegistry::with_defaults(),
        );
        sync.flush().await;

        assert_eq!(
            store.document(&docs::selected_categories_doc(&ada())),
            Some(json!({"categoryList": ["Work"]}))
        );
        assert_eq!(
            store.document(&docs::selected_progress_doc(&ada())),
            Some(json!({"progressList": ["Completed"]}))
        );
    }

    #[tokio::test]
    async fn sort_is_two_documents() {
        let (store, sync) = attached();
        sync.save_sort(&SortSpec::new(SortKind::Category, false));
        sync.flush().await;
        assert_eq!(
            store.document(&docs::sort_type_doc(&ada())),
            Some(json!({"sort": "FILTER"}))
        );
        assert_eq!(
            store.document(&docs::ascending_doc(&ada())),
            Some(json!({"ascending": false}))
        );
    }

    #[tokio::test]
    async fn failed_writes_are_swallowed() {
        let (store, sync) = attached();
        store.set_fail_writes(true);
        sync.save_task(&task(1));
        sync.flush().await;
        assert!(store.is_empty());
    }

    /// Panics on its first write, then behaves like the inner store.
    struct PanicsOnce {
        inner: MemoryStore,
        tripped: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl DocumentStore for PanicsOnce {
        async fn get(&self, path: &DocPath) -> Result<Option<Value>, crate::io::store::StoreError> {
            self.inner.get(path).await
        }

        async fn set(&self, path: &DocPath, value: Value) -> Result<(), crate::io::store::StoreError> {
            if !self.tripped.swap(true, std::sync::atomic::Ordering::SeqCst) {
                panic!("store blew up");
            }
            self.inner.set(path, value).await
        }

        async fn delete(&self, path: &DocPath) -> Result<(), crate::io::store::StoreError> {
            self.inner.delete(path).await
        }

        async fn list(&self, collection: &DocPath) -> Result<Vec<Value>, crate::io::store::StoreError> {
            self.inner.list(collection).await
        }
    }

    #[tokio::test]
    async fn writes_after_a_crashed_write_still_land() {
        let store = Arc::new(PanicsOnce {
            inner: MemoryStore::new(),
            tripped: std::sync::atomic::AtomicBool::new(false),
        });
        let sync = RemoteSync::new(store.clone(), Some(ada()));
        sync.save_task(&task(1));
        sync.save_task(&task(2));
        sync.flush().await;

        assert!(store.inner.document(&docs::task_doc(&ada(), 1)).is_none());
        assert!(store.inner.document(&docs::task_doc(&ada(), 2)).is_some());
        assert!(!sync.has_pending_writes());
    }

    #[tokio::test]
    async fn load_of_empty_store_is_all_absent() {
        let (_store, sync) = attached();
        let loaded = sync.load().await;
        assert!(loaded.tasks.is_empty());
        assert!(loaded.categories.is_none());
        assert!(loaded.selected_progress.is_none());
        assert!(loaded.sort.is_none());
    }

    #[tokio::test]
    async fn load_reads_every_slice() {
        let (_store, sync) = attached();
        sync.save_task(&task(10));
        sync.save_task(&task(2));
        let mut cats = CategoryRegistry::with_defaults();
        cats.reorder("Work", crate::ops::taxonomy_ops::Direction::Down)
            .unwrap();
        sync.save_categories(&cats);
        sync.save_progress(&ProgressRegistry::with_defaults());
        sync.save_selected_categories(&["Work".to_string()], &cats);
        sync.save_sort(&SortSpec::new(SortKind::Date, false));
        sync.flush().await;

        let loaded = sync.load().await;
        let ids: Vec<TaskId> = loaded.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 10]);
        let cat_keys: Vec<String> = loaded
            .categories
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(cat_keys[..2], ["Personal".to_string(), "Work".to_string()]);
        assert_eq!(loaded.progress.unwrap().len(), 5);
        assert_eq!(loaded.selected_categories, Some(vec!["Work".to_string()]));
        assert!(loaded.selected_progress.is_none());
        assert_eq!(loaded.sort, Some(SortSpec::new(SortKind::Date, false)));
    }

    #[tokio::test]
    async fn load_skips_malformed_documents() {
        let (store, sync) = attached();
        let user = ada();
        store
            .set(&docs::task_doc(&user, 1), json!({"name": "no fields"}))
            .await
            .unwrap();
        store
            .set(
                &docs::task_doc(&user, 2),
                json!({"name": "bad date", "category": "Work", "progress": "Completed",
                       "dateDue": "whenever", "id": 2}),
            )
            .await
            .unwrap();
        sync.save_task(&task(3));
        store
            .set(&docs::categories_doc(&user), json!({"categoryList": "nope"}))
            .await
            .unwrap();
        store
            .set(&docs::sort_type_doc(&user), json!({"sort": "DATE"}))
            .await
            .unwrap();
        sync.flush().await;

        let loaded = sync.load().await;
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].id, 3);
        assert!(loaded.categories.is_none());
        // half a sort state counts as none
        assert!(loaded.sort.is_none());
    }
}
