//! What the list actually shows, and mapping drags on it back to the store.

use super::task_store::TaskStore;
use crate::domain::storage::KeyValueStorage;
use crate::domain::task::{Filter, Task};

/// Tasks selected by `filter`, then narrowed to those whose title or
/// description contains `query` (trimmed, case-insensitive). Store order is kept.
pub fn displayed_tasks<'a>(all: &'a [Task], filter: Filter, query: &str) -> Vec<&'a Task> {
    let needle = query.trim().to_lowercase();
    all.iter()
        .filter(|t| filter.includes(t))
        .filter(|t| needle.is_empty() || t.matches(&needle))
        .collect()
}

/// Resolves a move between two displayed positions to full-collection
/// positions. `None` when nothing should move: no destination, same slot, or
/// a position outside the displayed list.
pub fn translate_reorder(all: &[Task], displayed: &[&Task], source: usize, destination: Option<usize>) -> Option<(usize, usize)> {
    let destination = destination?;
    if source == destination {
        return None;
    }
    let from_id = &displayed.get(source)?.id;
    let to_id = &displayed.get(destination)?.id;
    let from = all.iter().position(|t| &t.id == from_id)?;
    let to = all.iter().position(|t| &t.id == to_id)?;
    Some((from, to))
}

/// Translate-then-mutate in one step against the store's current state.
/// Returns whether the store changed.
pub fn reorder_in_view<S: KeyValueStorage>(
    store: &mut TaskStore<S>,
    filter: Filter,
    query: &str,
    source: usize,
    destination: Option<usize>,
) -> bool {
    let moved = {
        let all = store.all_tasks();
        let displayed = displayed_tasks(all, filter, query);
        translate_reorder(all, &displayed, source, destination)
    };
    match moved {
        Some((from, to)) => store.reorder_tasks(from, to),
        None => false,
    }
}
