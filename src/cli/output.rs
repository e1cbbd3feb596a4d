use serde::Serialize;

use crate::model::task::{Task, TaskId};
use crate::model::taxonomy::{EntryKind, TaxonomyEntry};
use crate::model::view::{SortKind, SortSpec};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: TaskId,
    pub name: String,
    pub category: String,
    pub progress: String,
    pub due: String,
}

#[derive(Serialize)]
pub struct SortJson {
    pub kind: String,
    pub ascending: bool,
}

#[derive(Serialize)]
pub struct ViewJson {
    pub sort: SortJson,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct EntryListJson {
    pub kind: EntryKind,
    pub entries: Vec<TaxonomyEntry>,
}

#[derive(Serialize)]
pub struct SortOptionJson {
    pub key: &'static str,
    pub label: &'static str,
    pub current: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id,
        name: task.name.clone(),
        category: task.category.clone(),
        progress: task.progress.clone(),
        due: task.due.format("%Y-%m-%d").to_string(),
    }
}

pub fn view_to_json(tasks: &[Task], sort: &SortSpec) -> ViewJson {
    ViewJson {
        sort: SortJson {
            kind: sort.kind.as_str().to_string(),
            ascending: sort.ascending,
        },
        tasks: tasks.iter().map(task_to_json).collect(),
    }
}

pub fn sort_options_to_json(sort: &SortSpec) -> Vec<SortOptionJson> {
    SortKind::options()
        .into_iter()
        .map(|(key, label)| SortOptionJson {
            key,
            label,
            current: SortKind::parse(key) == sort.kind,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    format!(
        "#{} {} {} [{}] <{}>",
        task.id,
        task.due.format("%Y-%m-%d"),
        task.name,
        task.category,
        task.progress
    )
}

/// Format the visible task list
pub fn format_view(tasks: &[Task]) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["(no tasks)".to_string()];
    }
    tasks.iter().map(format_task_line).collect()
}

/// Format a taxonomy listing, one numbered entry per line. Progress tags show
/// their color.
pub fn format_entries(kind: EntryKind, entries: &[TaxonomyEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| match kind {
            EntryKind::Category => format!("{}. {}", i + 1, e.key),
            EntryKind::Progress => format!("{}. {} {}", i + 1, e.key, e.label),
        })
        .collect()
}

/// Format the sort options, marking the current one
pub fn format_sort_options(sort: &SortSpec) -> Vec<String> {
    SortKind::options()
        .into_iter()
        .map(|(key, label)| {
            if SortKind::parse(key) == sort.kind {
                let direction = if sort.ascending { "ascending" } else { "descending" };
                format!("{label} (current, {direction})")
            } else {
                label.to_string()
            }
        })
        .collect()
}
