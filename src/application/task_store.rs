use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;

use super::persistence::{Persistence, TASKS_KEY};
use crate::domain::storage::KeyValueStorage;
use crate::domain::task::{Task, TaskColor, TaskId, TaskPatch, TaskStats};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task title cannot be empty")]
    EmptyTitle,
}

/// Owner of the ordered task collection.
///
/// Collection order is the manual ordering. Every successful mutation writes
/// the whole collection back under [`TASKS_KEY`]; lookups by a missing id are
/// silent no-ops and never touch storage.
pub struct TaskStore<S: KeyValueStorage> {
    tasks: Vec<Task>,
    persistence: Persistence<S>,
}

impl<S: KeyValueStorage> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        let persistence = Persistence::new(storage);
        let loaded: Vec<Task> = persistence.load(TASKS_KEY, Vec::new());
        let tasks = dedup_ids(loaded);
        tracing::info!(count = tasks.len(), "task store loaded");
        Self { tasks, persistence }
    }

    pub fn add_task(&mut self, title: &str, description: Option<&str>, color: Option<TaskColor>) -> Result<Task, TaskError> {
        let text = title.trim();
        if text.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        let task = Task {
            id: self.fresh_id(),
            text: text.to_string(),
            description: description.map(str::trim).unwrap_or_default().to_string(),
            color: color.unwrap_or_default(),
            completed: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        tracing::debug!(id = %task.id, "task added");
        self.tasks.push(task.clone());
        self.persist();
        Ok(task)
    }

    /// Flips completion. Does not stamp `updated_at`.
    pub fn toggle_task(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else { return false };
        task.completed = !task.completed;
        tracing::debug!(%id, completed = task.completed, "task toggled");
        self.persist();
        true
    }

    pub fn delete_task(&mut self, id: &TaskId) -> bool {
        let Some(pos) = self.position(id) else { return false };
        self.tasks.remove(pos);
        tracing::debug!(%id, "task deleted");
        self.persist();
        true
    }

    /// Applies the provided fields and stamps `updated_at`.
    ///
    /// A patch whose title trims to empty is rejected before lookup, leaving
    /// the collection untouched. Returns `Ok(false)` when `id` is unknown.
    pub fn update_task(&mut self, id: &TaskId, patch: TaskPatch) -> Result<bool, TaskError> {
        let text = match patch.text.as_deref().map(str::trim) {
            Some("") => return Err(TaskError::EmptyTitle),
            other => other.map(str::to_string),
        };
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else { return Ok(false) };
        if patch.is_empty() {
            return Ok(true);
        }
        if let Some(text) = text { task.text = text; }
        if let Some(d) = patch.description { task.description = d.trim().to_string(); }
        if let Some(c) = patch.color { task.color = c; }
        if let Some(done) = patch.completed { task.completed = done; }
        task.updated_at = Some(Utc::now());
        tracing::debug!(%id, "task updated");
        self.persist();
        Ok(true)
    }

    /// Moves the task at `from` so it ends up at `to`; both are positions in the
    /// full collection. Out-of-range indices are rejected without mutation.
    pub fn reorder_tasks(&mut self, from: usize, to: usize) -> bool {
        let len = self.tasks.len();
        if from >= len || to >= len {
            tracing::warn!(from, to, len, "reorder out of range ignored");
            return false;
        }
        if from == to {
            return false;
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        tracing::debug!(from, to, "tasks reordered");
        self.persist();
        true
    }

    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    pub fn all_tasks(&self) -> &[Task] { &self.tasks }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.completed).collect()
    }

    pub fn pending_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| !t.completed).collect()
    }

    pub fn task_stats(&self) -> TaskStats {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        TaskStats { total: self.tasks.len(), completed, pending: self.tasks.len() - completed }
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&self) {
        self.persistence.save(TASKS_KEY, &self.tasks);
    }
}

/// Keeps the first occurrence of each id; stored data from older builds could
/// carry collisions.
fn dedup_ids(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let before = tasks.len();
    let tasks: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id.clone())).collect();
    if tasks.len() != before {
        tracing::warn!(dropped = before - tasks.len(), "duplicate task ids in storage");
    }
    tasks
}
