// src/core/registry.rs — In-memory task registry
//
// Concurrency discipline: each record has exactly one writer (its loop),
// which mutates it through short `update` closures under the write lock.
// Readers get a cloned snapshot, so they never see a half-applied update.
// Records are never evicted; they live as long as the registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::types::{Task, TaskSummary};

#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, task: Task) {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        tasks.insert(task.task_id.clone(), task);
    }

    /// Snapshot of one task.
    pub fn get(&self, task_id: &str) -> Option<Task> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        tasks.get(task_id).cloned()
    }

    /// Apply `f` to a running task. Returns false if the task is unknown or
    /// already terminal; terminal records are frozen.
    pub fn update<F>(&self, task_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        match tasks.get_mut(task_id) {
            Some(task) if !task.status.is_terminal() => {
                f(task);
                true
            }
            _ => false,
        }
    }

    /// Summaries of all tasks, oldest first.
    pub fn list(&self) -> Vec<TaskSummary> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<TaskSummary> = tasks.values().map(Task::summary).collect();
        out.sort_by_key(|s| s.created_at);
        out
    }

    pub fn len(&self) -> usize {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
