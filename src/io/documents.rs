//! Shapes of the per-user documents and where they live.
//!
//! ```text
//! users/<uid>/taskList/<id>                       TaskRecord
//! users/<uid>/categories/categoriesSortedList     CategoryListDoc
//! users/<uid>/categories/selectedCategoriesList   SelectedCategoriesDoc
//! users/<uid>/progress/progressListSorted         ProgressListDoc
//! users/<uid>/progress/selectedProgressList       SelectedProgressDoc
//! users/<uid>/sort/sortType                       SortTypeDoc
//! users/<uid>/sort/ascendingType                  AscendingDoc
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::io::store::{DocPath, StoreError, is_valid_segment};
use crate::model::task::{Task, TaskId};
use crate::model::taxonomy::{CategoryRegistry, ProgressRegistry};

/// Stable identifier of a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Validate a user id; it becomes a path segment in the store.
    pub fn new(id: impl Into<String>) -> Result<Self, StoreError> {
        let id = id.into();
        if !is_valid_segment(&id) {
            return Err(StoreError::InvalidPath(format!("bad user id {id:?}")));
        }
        Ok(UserId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

fn user_root(user: &UserId) -> DocPath {
    DocPath::new(["users", user.as_str()])
}

pub fn task_collection(user: &UserId) -> DocPath {
    user_root(user).child("taskList")
}

pub fn task_doc(user: &UserId, id: TaskId) -> DocPath {
    task_collection(user).child(id.to_string())
}

pub fn categories_doc(user: &UserId) -> DocPath {
    user_root(user).child("categories").child("categoriesSortedList")
}

pub fn selected_categories_doc(user: &UserId) -> DocPath {
    user_root(user).child("categories").child("selectedCategoriesList")
}

pub fn progress_doc(user: &UserId) -> DocPath {
    user_root(user).child("progress").child("progressListSorted")
}

pub fn selected_progress_doc(user: &UserId) -> DocPath {
    user_root(user).child("progress").child("selectedProgressList")
}

pub fn sort_type_doc(user: &UserId) -> DocPath {
    user_root(user).child("sort").child("sortType")
}

pub fn ascending_doc(user: &UserId) -> DocPath {
    user_root(user).child("sort").child("ascendingType")
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Error type for decoding stored records
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("task {id}: unreadable due date {value:?}")]
    BadDueDate { id: TaskId, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub category: String,
    pub progress: String,
    #[serde(rename = "dateDue")]
    pub date_due: String,
    pub id: TaskId,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        TaskRecord {
            name: task.name.clone(),
            category: task.category.clone(),
            progress: task.progress.clone(),
            date_due: format_due_date(task.due),
            id: task.id,
        }
    }
}

impl TaskRecord {
    pub fn into_task(self) -> Result<Task, DecodeError> {
        let due = parse_stored_date(&self.date_due).ok_or_else(|| DecodeError::BadDueDate {
            id: self.id,
            value: self.date_due.clone(),
        })?;
        Ok(Task {
            id: self.id,
            name: self.name,
            category: self.category,
            progress: self.progress,
            due,
        })
    }
}

/// `2024-04-01` → `2024-04-01T00:00:00.000Z`
pub fn format_due_date(date: NaiveDate) -> String {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accept any RFC 3339 timestamp or a bare `YYYY-MM-DD`.
///
/// A timestamp decodes to the calendar date in its own offset, never the
/// reader's local zone, so the UTC midnights written by `format_due_date`
/// read back unchanged wherever the reader runs.
pub fn parse_stored_date(value: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryListDoc {
    #[serde(rename = "categoryList", default)]
    pub category_list: Vec<CategoryEntry>,
}

impl From<&CategoryRegistry> for CategoryListDoc {
    fn from(categories: &CategoryRegistry) -> Self {
        CategoryListDoc {
            category_list: categories
                .iter()
                .map(|(key, value)| CategoryEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressListDoc {
    #[serde(rename = "progressList", default)]
    pub progress_list: Vec<ProgressEntry>,
}

impl From<&ProgressRegistry> for ProgressListDoc {
    fn from(progress: &ProgressRegistry) -> Self {
        ProgressListDoc {
            progress_list: progress
                .iter()
                .map(|(name, color)| ProgressEntry {
                    name: name.to_string(),
                    color: color.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCategoriesDoc {
    #[serde(rename = "categoryList", default)]
    pub category_list: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedProgressDoc {
    #[serde(rename = "progressList", default)]
    pub progress_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortTypeDoc {
    pub sort: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AscendingDoc {
    pub ascending: bool,
}
