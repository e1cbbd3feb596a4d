use indexmap::IndexMap;

use crate::io::sync::RemoteSync;
use crate::model::task::{Task, TaskId};

/// The board's tasks, keyed by id, in insertion order.
///
/// Every mutation schedules the matching remote write; the store itself never
/// waits for it.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: IndexMap<TaskId, Task>,
    sync: RemoteSync,
}

impl TaskStore {
    pub fn new(sync: RemoteSync) -> Self {
        TaskStore {
            tasks: IndexMap::new(),
            sync,
        }
    }

    /// Insert a task under its own id and persist it.
    pub fn add(&mut self, task: Task) {
        self.sync.save_task(&task);
        self.tasks.insert(task.id, task);
    }

    /// Insert a task read back from storage (no write is scheduled).
    pub(crate) fn insert_loaded(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    /// Remove a task. Missing ids are ignored.
    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        let removed = self.tasks.shift_remove(&id)?;
        self.sync.delete_task(id);
        Some(removed)
    }

    /// Replace the record stored under `id`, keeping its position.
    ///
    /// The caller keeps `task.id` and `id` consistent.
    pub fn edit(&mut self, id: TaskId, task: Task) {
        self.sync.save_task(&task);
        self.tasks.insert(id, task);
    }

    /// Point every task in category `old` at `new`. Returns how many changed.
    pub fn cascade_category_rename(&mut self, old: &str, new: &str) -> usize {
        let affected: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.category == old)
            .map(|t| t.with_category(new))
            .collect();
        let count = affected.len();
        for task in affected {
            self.edit(task.id, task);
        }
        count
    }

    /// Point every task with progress `old` at `new`. Returns how many changed.
    pub fn cascade_progress_rename(&mut self, old: &str, new: &str) -> usize {
        let affected: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.progress == old)
            .map(|t| t.with_progress(new))
            .collect();
        let count = affected.len();
        for task in affected {
            self.edit(task.id, task);
        }
        count
    }

    /// Id for the next new task: one past the current maximum, or 1.
    pub fn next_id(&self) -> TaskId {
        self.tasks.keys().max().map_or(1, |max| max + 1)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Snapshot of all tasks, most recently added first
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.values().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn task(id: TaskId, name: &str, category: &str, progress: &str) -> Task {
        Task::new(id, name, category, progress, date(2024, 4, 1))
    }

    fn store() -> TaskStore {
        TaskStore::new(RemoteSync::detached())
    }

    fn ids(store: &TaskStore) -> Vec<TaskId> {
        store.tasks().iter().map(|t| t.id).collect()
    }

    #[test]
    fn next_id_on_empty_store_is_one() {
        assert_eq!(store().next_id(), 1);
    }

    #[test]
    fn next_id_is_max_plus_one() {
        let mut s = store();
        for id in [1, 3, 4] {
            s.add(task(id, "t", "Work", "Not Started"));
        }
        assert_eq!(s.next_id(), 5);
        s.delete(4);
        assert_eq!(s.next_id(), 4);
    }

    #[test]
    fn tasks_are_listed_most_recent_first() {
        let mut s = store();
        s.add(task(1, "a", "Work", "Not Started"));
        s.add(task(2, "b", "Work", "Not Started"));
        s.add(task(3, "c", "Work", "Not Started"));
        assert_eq!(ids(&s), vec![3, 2, 1]);
    }

    #[test]
    fn edit_replaces_in_place() {
        let mut s = store();
        s.add(task(1, "a", "Work", "Not Started"));
        s.add(task(2, "b", "Work", "Not Started"));
        s.edit(1, task(1, "a2", "Health", "Completed"));
        assert_eq!(ids(&s), vec![2, 1]);
        let edited = s.get(1).unwrap();
        assert_eq!(edited.name, "a2");
        assert_eq!(edited.category, "Health");
    }

    #[test]
    fn delete_missing_is_silent() {
        let mut s = store();
        s.add(task(1, "a", "Work", "Not Started"));
        assert!(s.delete(9).is_none());
        assert_eq!(s.len(), 1);
        assert!(s.delete(1).is_some());
        assert!(s.is_empty());
    }

    #[test]
    fn cascade_category_rename_rewrites_every_reference() {
        let mut s = store();
        s.add(task(1, "a", "Work", "Not Started"));
        s.add(task(2, "b", "Health", "Not Started"));
        s.add(task(3, "c", "Work", "Completed"));
        let changed = s.cascade_category_rename("Work", "Job");
        assert_eq!(changed, 2);
        let tasks = s.tasks();
        assert_eq!(tasks.iter().filter(|t| t.category == "Job").count(), 2);
        assert_eq!(tasks.iter().filter(|t| t.category == "Work").count(), 0);
        assert_eq!(ids(&s), vec![3, 2, 1]);
    }

    #[test]
    fn cascade_progress_rename_leaves_others_alone() {
        let mut s = store();
        s.add(task(1, "a", "Work", "Not Started"));
        s.add(task(2, "b", "Work", "Completed"));
        assert_eq!(s.cascade_progress_rename("Completed", "Done"), 1);
        assert_eq!(s.get(1).unwrap().progress, "Not Started");
        assert_eq!(s.get(2).unwrap().progress, "Done");
    }
}
