use chrono::NaiveDate;

use crate::io::sync::RemoteSync;
use crate::model::task::{Task, TaskId};
use crate::model::taxonomy::{CategoryRegistry, EntryKind, ProgressRegistry, Taxonomy, TaxonomyKind};
use crate::model::view::{Selection, SortKind, SortSpec};
use crate::ops::task_ops::TaskStore;
use crate::ops::taxonomy_ops::{Direction, TaxonomyError};
use crate::ops::view;

/// Error type for board verbs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown progress tag: {0}")]
    UnknownProgress(String),
    #[error("progress tag {0} needs a color")]
    MissingColor(String),
    #[error("invalid color {0:?} (expected #rrggbb)")]
    InvalidColor(String),
    #[error("unknown entry kind: {0}")]
    UnknownKind(u8),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("name must not be empty")]
    EmptyName,
}

/// Map a numeric kind discriminator (1 = category, 2 = progress tag)
pub fn entry_kind(code: u8) -> Result<EntryKind, BoardError> {
    EntryKind::from_code(code).ok_or(BoardError::UnknownKind(code))
}

/// The whole model a front end talks to.
///
/// Every verb mutates the in-memory state synchronously, schedules the
/// matching remote writes, and returns the new visible task list.
#[derive(Debug, Clone)]
pub struct Board {
    store: TaskStore,
    categories: CategoryRegistry,
    progress: ProgressRegistry,
    selection: Selection,
    sort: SortSpec,
    sync: RemoteSync,
}

impl Board {
    /// A fresh board: default taxonomies, every key selected, no tasks.
    /// Nothing is written.
    pub fn new(sync: RemoteSync) -> Self {
        let categories = CategoryRegistry::with_defaults();
        let progress = ProgressRegistry::with_defaults();
        let selection = Selection::new(all_keys(&categories), all_keys(&progress));
        Board {
            store: TaskStore::new(sync.clone()),
            categories,
            progress,
            selection,
            sort: SortSpec::default(),
            sync,
        }
    }

    /// Load the user's board through `sync`, falling back to defaults for
    /// anything missing. Loading never writes.
    pub async fn bootstrap(sync: RemoteSync) -> Self {
        let loaded = sync.load().await;

        let mut store = TaskStore::new(sync.clone());
        for task in loaded.tasks {
            store.insert_loaded(task);
        }
        let categories = loaded
            .categories
            .and_then(CategoryRegistry::from_entries)
            .unwrap_or_else(CategoryRegistry::with_defaults);
        let progress = loaded
            .progress
            .and_then(ProgressRegistry::from_entries)
            .unwrap_or_else(ProgressRegistry::with_defaults);
        let selection = Selection::new(
            loaded
                .selected_categories
                .unwrap_or_else(|| all_keys(&categories)),
            loaded
                .selected_progress
                .unwrap_or_else(|| all_keys(&progress)),
        );

        tracing::debug!(
            tasks = store.len(),
            categories = categories.len(),
            progress = progress.len(),
            sort = %loaded.sort.as_ref().map_or("NONE", |s| s.kind.as_str()),
            "board ready"
        );

        Board {
            store,
            categories,
            progress,
            selection,
            sort: loaded.sort.unwrap_or_default(),
            sync,
        }
    }

    /// The visible task list: the current selection, then the current sort.
    pub fn view(&self) -> Vec<Task> {
        view::project(
            &self.store.tasks(),
            &self.selection,
            &self.sort,
            &self.categories,
            &self.progress,
        )
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Create a task with the next free id. `None` due date means today.
    pub fn add_task(
        &mut self,
        name: &str,
        category: &str,
        progress: &str,
        due: Option<NaiveDate>,
    ) -> Result<Vec<Task>, BoardError> {
        let name = non_empty(name)?;
        self.check_refs(category, progress)?;
        let task = Task::new(self.store.next_id(), name, category, progress, due);
        tracing::debug!(id = task.id, "adding task");
        self.store.add(task);
        Ok(self.view())
    }

    /// Remove a task. Unknown ids are ignored.
    pub fn delete_task(&mut self, id: TaskId) -> Vec<Task> {
        self.store.delete(id);
        self.view()
    }

    /// Replace the whole record of task `id`. `None` due date means today.
    pub fn edit_task(
        &mut self,
        name: &str,
        category: &str,
        id: TaskId,
        progress: &str,
        due: Option<NaiveDate>,
    ) -> Result<Vec<Task>, BoardError> {
        if !self.store.contains(id) {
            return Err(BoardError::TaskNotFound(id));
        }
        let name = non_empty(name)?;
        self.check_refs(category, progress)?;
        let task = Task::new(id, name, category, progress, due);
        self.store.edit(id, task);
        Ok(self.view())
    }

    fn check_refs(&self, category: &str, progress: &str) -> Result<(), BoardError> {
        if !self.categories.contains(category) {
            return Err(BoardError::UnknownCategory(category.to_string()));
        }
        if !self.progress.contains(progress) {
            return Err(BoardError::UnknownProgress(progress.to_string()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Filter and sort
    // -----------------------------------------------------------------------

    /// Replace the selection. Both lists empty is the "no filter" state and
    /// is not persisted.
    pub fn filter_tasks(&mut self, categories: Vec<String>, progress: Vec<String>) -> Vec<Task> {
        self.selection = Selection::new(categories, progress);
        self.persist_selection();
        self.view()
    }

    pub fn sort_tasks_by(&mut self, kind: SortKind, ascending: bool) -> Vec<Task> {
        self.sort = SortSpec::new(kind, ascending);
        self.sync.save_sort(&self.sort);
        self.view()
    }

    fn persist_selection(&self) {
        if self.selection.is_unconfigured() {
            return;
        }
        self.sync
            .save_selected_categories(&self.selection.categories, &self.categories);
        self.sync
            .save_selected_progress(&self.selection.progress, &self.progress);
    }

    // -----------------------------------------------------------------------
    // Taxonomies
    // -----------------------------------------------------------------------

    /// Register a category or progress tag and select it. Progress tags need
    /// a `#rrggbb` color.
    pub fn add_taxonomy_entry(
        &mut self,
        name: &str,
        kind: EntryKind,
        color: Option<&str>,
    ) -> Result<Vec<Task>, BoardError> {
        let name = non_empty(name)?;
        match kind {
            EntryKind::Category => {
                self.categories.add(name, name)?;
                select(&mut self.selection.categories, name);
                self.sync.save_categories(&self.categories);
            }
            EntryKind::Progress => {
                let color = require_color(name, color)?;
                self.progress.add(name, &color)?;
                select(&mut self.selection.progress, name);
                self.sync.save_progress(&self.progress);
            }
        }
        self.persist_selection();
        Ok(self.view())
    }

    /// Unregister an entry. Tasks still referencing it keep the stale name.
    pub fn delete_taxonomy_entry(
        &mut self,
        name: &str,
        kind: EntryKind,
    ) -> Result<Vec<Task>, BoardError> {
        match kind {
            EntryKind::Category => {
                self.categories.delete(name)?;
                self.selection.categories.retain(|k| k != name);
                self.sync.save_categories(&self.categories);
            }
            EntryKind::Progress => {
                self.progress.delete(name)?;
                self.selection.progress.retain(|k| k != name);
                self.sync.save_progress(&self.progress);
            }
        }
        self.persist_selection();
        Ok(self.view())
    }

    /// Rename an entry (and recolor, for progress tags), then move every
    /// task referencing the old name over to the new one.
    pub fn edit_taxonomy_entry(
        &mut self,
        original: &str,
        new: &str,
        kind: EntryKind,
        color: Option<&str>,
    ) -> Result<Vec<Task>, BoardError> {
        let new = non_empty(new)?;
        match kind {
            EntryKind::Category => {
                self.categories.rename(original, new, None)?;
                let moved = self.store.cascade_category_rename(original, new);
                tracing::debug!(from = original, to = new, tasks = moved, "renamed category");
                rename_selected(&mut self.selection.categories, original, new);
                self.sync.save_categories(&self.categories);
            }
            EntryKind::Progress => {
                let color = color.map(normalize_color).transpose()?;
                self.progress.rename(original, new, color.as_deref())?;
                if new != original {
                    let moved = self.store.cascade_progress_rename(original, new);
                    tracing::debug!(from = original, to = new, tasks = moved, "renamed progress tag");
                    rename_selected(&mut self.selection.progress, original, new);
                }
                self.sync.save_progress(&self.progress);
            }
        }
        self.persist_selection();
        Ok(self.view())
    }

    /// Move an entry one step in display order.
    pub fn reorder_taxonomy_entry(
        &mut self,
        name: &str,
        kind: EntryKind,
        up: bool,
    ) -> Result<Vec<Task>, BoardError> {
        let direction = Direction::from_up(up);
        match kind {
            EntryKind::Category => {
                self.categories.reorder(name, direction)?;
                self.sync.save_categories(&self.categories);
            }
            EntryKind::Progress => {
                self.progress.reorder(name, direction)?;
                self.sync.save_progress(&self.progress);
            }
        }
        Ok(self.view())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn next_id(&self) -> TaskId {
        self.store.next_id()
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn progress(&self) -> &ProgressRegistry {
        &self.progress
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// All tasks in store order, ignoring filter and sort
    pub fn tasks(&self) -> Vec<Task> {
        self.store.tasks()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    pub fn sync(&self) -> &RemoteSync {
        &self.sync
    }
}

fn all_keys<K: TaxonomyKind>(taxonomy: &Taxonomy<K>) -> Vec<String> {
    taxonomy.keys().map(str::to_string).collect()
}

fn non_empty(name: &str) -> Result<&str, BoardError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BoardError::EmptyName);
    }
    Ok(name)
}

fn select(selected: &mut Vec<String>, key: &str) {
    if !selected.iter().any(|k| k == key) {
        selected.push(key.to_string());
    }
}

fn rename_selected(selected: &mut [String], old: &str, new: &str) {
    for key in selected.iter_mut().filter(|k| *k == old) {
        *key = new.to_string();
    }
}

fn require_color(name: &str, color: Option<&str>) -> Result<String, BoardError> {
    let color = color.ok_or_else(|| BoardError::MissingColor(name.to_string()))?;
    normalize_color(color)
}

/// `#RRGGBB` in any case → lowercase `#rrggbb`
fn normalize_color(color: &str) -> Result<String, BoardError> {
    let trimmed = color.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(BoardError::InvalidColor(color.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}
