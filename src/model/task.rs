use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Store-assigned task identifier
pub type TaskId = u64;

/// A single task on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique, immutable once assigned
    pub id: TaskId,
    /// Task title text
    pub name: String,
    /// Key of the category this task belongs to
    pub category: String,
    /// Key of the progress tag describing this task
    pub progress: String,
    /// Calendar date the task is due
    pub due: NaiveDate,
}

impl Task {
    /// Create a task. A missing due date means "due today".
    pub fn new(
        id: TaskId,
        name: impl Into<String>,
        category: impl Into<String>,
        progress: impl Into<String>,
        due: Option<NaiveDate>,
    ) -> Self {
        Task {
            id,
            name: name.into(),
            category: category.into(),
            progress: progress.into(),
            due: due.unwrap_or_else(today),
        }
    }

    /// Copy of this task pointing at a different category
    pub fn with_category(&self, category: &str) -> Self {
        Task {
            category: category.to_string(),
            ..self.clone()
        }
    }

    /// Copy of this task pointing at a different progress tag
    pub fn with_progress(&self, progress: &str) -> Self {
        Task {
            progress: progress.to_string(),
            ..self.clone()
        }
    }
}

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date as typed by a user
pub fn parse_due_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}
