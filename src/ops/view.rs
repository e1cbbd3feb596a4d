//! Derive the visible task list from the board's state.
//!
//! Everything here is pure: the same inputs always give the same list.

use std::cmp::Ordering;

use crate::model::task::Task;
use crate::model::taxonomy::{Taxonomy, TaxonomyKind};
use crate::model::view::{Selection, SortKind, SortSpec};

/// Keep the tasks admitted by `selection`.
///
/// An unconfigured selection (both lists empty) passes everything through.
/// Otherwise a task must match on category AND progress, so a selection with
/// one empty list admits nothing.
pub fn filter_tasks(tasks: &[Task], selection: &Selection) -> Vec<Task> {
    if selection.is_unconfigured() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|t| selection.admits(&t.category, &t.progress))
        .cloned()
        .collect()
}

/// Index of `key` in the taxonomy's display order; -1 for orphaned references.
fn display_rank<K: TaxonomyKind>(taxonomy: &Taxonomy<K>, key: &str) -> i64 {
    taxonomy.position(key).map_or(-1, |i| i as i64)
}

fn directed(ordering: Ordering, ascending: bool) -> Ordering {
    if ascending { ordering } else { ordering.reverse() }
}

/// Order tasks (given in store order) according to `sort`.
///
/// Sorting is stable, so ties keep their store order in both directions.
pub fn sort_tasks<C: TaxonomyKind, P: TaxonomyKind>(
    mut tasks: Vec<Task>,
    sort: &SortSpec,
    categories: &Taxonomy<C>,
    progress: &Taxonomy<P>,
) -> Vec<Task> {
    let ascending = sort.ascending;
    match &sort.kind {
        SortKind::None => {
            if !ascending {
                tasks.reverse();
            }
        }
        SortKind::Date => {
            tasks.sort_by(|a, b| directed(a.due.cmp(&b.due), ascending));
        }
        SortKind::Category => {
            tasks.sort_by(|a, b| {
                let ra = display_rank(categories, &a.category);
                let rb = display_rank(categories, &b.category);
                directed(ra.cmp(&rb), ascending)
            });
        }
        SortKind::Progress => {
            tasks.sort_by(|a, b| {
                let ra = display_rank(progress, &a.progress);
                let rb = display_rank(progress, &b.progress);
                directed(ra.cmp(&rb), ascending)
            });
        }
        SortKind::Unrecognized(_) => {}
    }
    tasks
}

/// The list a front end renders: `sort(filter(tasks))`.
pub fn project<C: TaxonomyKind, P: TaxonomyKind>(
    tasks: &[Task],
    selection: &Selection,
    sort: &SortSpec,
    categories: &Taxonomy<C>,
    progress: &Taxonomy<P>,
) -> Vec<Task> {
    sort_tasks(filter_tasks(tasks, selection), sort, categories, progress)
}
