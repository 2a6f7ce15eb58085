//! In-memory task collection backed by a persistent slot.
//!
//! # Responsibility
//! - Own the task collection; every read and write goes through here.
//! - Write the whole collection through after each effective mutation.
//! - Replace the collection wholesale when another writer changes the key.
//!
//! # Invariants
//! - Collection order is insertion order; column membership is a filter.
//! - Ids are unique for the lifetime of the collection.
//! - Write paths validate before mutating; a rejected write changes nothing.
//! - Lookup misses on update/delete/move are explicit no-ops, not errors.
//! - Storage write failures are logged and swallowed; memory stays
//!   authoritative for the session.

use crate::model::task::{
    Column, Task, TaskDraft, TaskId, TaskLimits, TaskPatch, TaskValidationError,
};
use crate::store::{KeyValueStore, PersistentSlot, StorageEvent};
use chrono::{SubsecRound, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Task repository over any `KeyValueStore`.
pub struct TaskRepository<S: KeyValueStore> {
    store: S,
    slot: PersistentSlot<Vec<Task>>,
    limits: TaskLimits,
    tasks: Vec<Task>,
}

impl<S: KeyValueStore> TaskRepository<S> {
    /// Loads the collection stored under `key`.
    ///
    /// A missing, unreadable or corrupt value yields an empty board. Records
    /// repeating an earlier id are dropped.
    pub fn open(mut store: S, key: impl Into<String>, limits: TaskLimits) -> Self {
        let slot = PersistentSlot::new(key, Vec::new());
        let tasks = dedupe_ids(slot.load(&mut store));
        info!(
            "event=tasks_load module=repo status=ok key={} task_count={}",
            slot.key(),
            tasks.len()
        );
        Self {
            store,
            slot,
            limits,
            tasks,
        }
    }

    /// Storage key holding the serialized collection.
    pub fn key(&self) -> &str {
        self.slot.key()
    }

    /// All tasks in collection order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Releases the repository and returns the backing store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Creates a `todo` task from validated form input and appends it.
    ///
    /// # Contract
    /// - Assigns a fresh id not present in the collection.
    /// - Stamps `created_at` with the current time.
    ///
    /// # Errors
    /// - Returns the first field-level validation failure; nothing is stored.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task, TaskValidationError> {
        let mut id = TaskId::generate();
        while self.position(&id).is_some() {
            id = TaskId::generate();
        }

        let task = Task::from_draft(id, draft, Utc::now().trunc_subsecs(3));
        if let Err(err) = task.validate(&self.limits) {
            debug!(
                "event=task_create module=repo status=rejected field={}",
                err.field().as_str()
            );
            return Err(err);
        }

        self.tasks.push(task.clone());
        info!(
            "event=task_create module=repo status=ok task_id={} column={}",
            task.id, task.column
        );
        self.persist();
        Ok(task)
    }

    /// Shallow-merges `patch` over the task with `id`.
    ///
    /// Returns `Ok(None)` when no task has `id`. `id` and `created_at` are
    /// never touched. An empty or ineffective patch does not write.
    ///
    /// # Errors
    /// - Returns a validation failure when the merged record is invalid; the
    ///   stored record is left unchanged.
    pub fn update(
        &mut self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, TaskValidationError> {
        let Some(index) = self.position(id) else {
            debug!("event=task_update module=repo status=skip reason=not_found task_id={id}");
            return Ok(None);
        };

        let mut merged = self.tasks[index].clone();
        patch.apply_to(&mut merged);
        if let Err(err) = merged.validate(&self.limits) {
            debug!(
                "event=task_update module=repo status=rejected task_id={} field={}",
                id,
                err.field().as_str()
            );
            return Err(err);
        }

        if merged != self.tasks[index] {
            self.tasks[index] = merged.clone();
            info!("event=task_update module=repo status=ok task_id={id}");
            self.persist();
        }
        Ok(Some(merged))
    }

    /// Removes the task with `id` and returns it, or `None` when absent.
    pub fn delete(&mut self, id: &TaskId) -> Option<Task> {
        let Some(index) = self.position(id) else {
            debug!("event=task_delete module=repo status=skip reason=not_found task_id={id}");
            return None;
        };

        let removed = self.tasks.remove(index);
        info!("event=task_delete module=repo status=ok task_id={id}");
        self.persist();
        Some(removed)
    }

    /// Reassigns the task with `id` to `column`.
    ///
    /// Returns `false` when no task has `id`. Moving to the current column is
    /// accepted but does not write. All other fields are preserved.
    pub fn move_task(&mut self, id: &TaskId, column: Column) -> bool {
        let Some(index) = self.position(id) else {
            debug!("event=task_move module=repo status=skip reason=not_found task_id={id}");
            return false;
        };

        let task = &mut self.tasks[index];
        if task.column != column {
            let from = task.column;
            task.column = column;
            info!("event=task_move module=repo status=ok task_id={id} from={from} to={column}");
            self.persist();
        }
        true
    }

    pub fn find_by_id(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Tasks in `column`, in collection order, before any view filter.
    pub fn list_by_column(&self, column: Column) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.column == column)
            .collect()
    }

    /// Total number of tasks in `column`, ignoring any view filter.
    pub fn count_by_column(&self, column: Column) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.column == column)
            .count()
    }

    /// Re-reads the collection from storage, discarding in-memory state.
    pub fn reload(&mut self) {
        self.tasks = dedupe_ids(self.slot.load(&mut self.store));
        info!(
            "event=tasks_reload module=repo status=ok task_count={}",
            self.tasks.len()
        );
    }

    /// Empties the board and removes its storage key.
    pub fn clear(&mut self) {
        self.tasks.clear();
        if let Err(err) = self.store.remove(self.slot.key()) {
            warn!(
                "event=tasks_clear module=repo status=error key={} error={}",
                self.slot.key(),
                err
            );
            return;
        }
        info!("event=tasks_clear module=repo status=ok key={}", self.slot.key());
    }

    /// Applies a change notification from another writer.
    ///
    /// A decodable value for this repository's key replaces the whole
    /// collection (last writer wins, no merge) and is not written back.
    /// Records repeating an earlier id are dropped.
    /// Returns whether the collection was replaced.
    pub fn apply_storage_event(&mut self, event: &StorageEvent) -> bool {
        let Some(tasks) = self.slot.decode_event(event) else {
            return false;
        };
        let tasks = dedupe_ids(tasks);
        info!(
            "event=tasks_external_replace module=repo status=ok previous_count={} task_count={}",
            self.tasks.len(),
            tasks.len()
        );
        self.tasks = tasks;
        true
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn persist(&mut self) {
        self.slot.save(&mut self.store, &self.tasks);
    }
}

/// Keeps the first record for each id.
fn dedupe_ids(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    tasks
        .into_iter()
        .filter(|task| {
            let first = seen.insert(task.id.clone());
            if !first {
                warn!(
                    "event=tasks_load module=repo status=skip reason=duplicate_id task_id={}",
                    task.id
                );
            }
            first
        })
        .collect()
}
