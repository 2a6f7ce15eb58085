//! Board use-case service.
//!
//! # Responsibility
//! - Own the task repository, theme preference, view filter and drag
//!   coordinator for one board session.
//! - Give the presentation layer one synchronous entry point per action.
//!
//! # Invariants
//! - One `Board` per store; `open` is the only init path and `close` the
//!   only teardown path.
//! - View filter state is session-only and never persisted.
//! - Storage events are applied as full replacements and never written back.

use crate::config::{BoardConfig, ConfigError};
use crate::drag::{DragCommand, DragCoordinator, DragEvent, DragState};
use crate::filter::TaskFilter;
use crate::model::task::{
    Column, Priority, Task, TaskDraft, TaskId, TaskPatch, TaskValidationError,
};
use crate::model::theme::Theme;
use crate::repo::task_repo::TaskRepository;
use crate::store::{KeyValueStore, PersistentSlot, StorageEvent};
use log::{info, warn};
use std::time::Instant;

/// Header data for one column: title and "visible/total" counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSummary {
    pub column: Column,
    pub title: &'static str,
    /// Tasks passing the current search/priority filter.
    pub visible: usize,
    /// All tasks in the column.
    pub total: usize,
}

/// One board session over a key-value store.
pub struct Board<S: KeyValueStore> {
    config: BoardConfig,
    tasks: TaskRepository<S>,
    theme_slot: PersistentSlot<Theme>,
    theme: Theme,
    filter: TaskFilter,
    drag: DragCoordinator,
}

impl<S: KeyValueStore> Board<S> {
    /// Loads tasks and theme from `store`.
    ///
    /// Unreadable stored values fall back to an empty board and the light
    /// theme; only an invalid `config` fails.
    pub fn open(store: S, config: BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let started_at = Instant::now();

        let mut tasks = TaskRepository::open(store, config.tasks_key.clone(), config.limits);
        let theme_slot = PersistentSlot::new(config.theme_key.clone(), Theme::default());
        let theme = theme_slot.load(tasks.store_mut());

        info!(
            "event=board_open module=service status=ok task_count={} theme={} duration_ms={}",
            tasks.len(),
            theme,
            started_at.elapsed().as_millis()
        );
        Ok(Self {
            config,
            tasks,
            theme_slot,
            theme,
            filter: TaskFilter::default(),
            drag: DragCoordinator::new(),
        })
    }

    /// Ends the session and hands the store back.
    pub fn close(self) -> S {
        info!(
            "event=board_close module=service status=ok task_count={}",
            self.tasks.len()
        );
        self.tasks.into_store()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// All tasks in collection order.
    pub fn tasks(&self) -> &[Task] {
        self.tasks.tasks()
    }

    pub fn create_task(&mut self, draft: TaskDraft) -> Result<Task, TaskValidationError> {
        self.tasks.create(draft)
    }

    pub fn update_task(
        &mut self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, TaskValidationError> {
        self.tasks.update(id, patch)
    }

    pub fn delete_task(&mut self, id: &TaskId) -> Option<Task> {
        self.tasks.delete(id)
    }

    pub fn move_task(&mut self, id: &TaskId, column: Column) -> bool {
        self.tasks.move_task(id, column)
    }

    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.find_by_id(id)
    }

    pub fn list_by_column(&self, column: Column) -> Vec<&Task> {
        self.tasks.list_by_column(column)
    }

    pub fn count_by_column(&self, column: Column) -> usize {
        self.tasks.count_by_column(column)
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn search_query(&self) -> &str {
        self.filter.query.as_str()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
    }

    pub fn priority_filter(&self) -> Option<Priority> {
        self.filter.priority
    }

    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        self.filter.priority = priority;
    }

    /// Tasks of `column` that pass the current filter, in collection order.
    pub fn visible_by_column(&self, column: Column) -> Vec<&Task> {
        self.filter.apply(self.tasks.list_by_column(column))
    }

    pub fn column_summary(&self, column: Column) -> ColumnSummary {
        ColumnSummary {
            column,
            title: column.title(),
            visible: self.visible_by_column(column).len(),
            total: self.tasks.count_by_column(column),
        }
    }

    /// Summaries for every column in board order.
    pub fn column_summaries(&self) -> Vec<ColumnSummary> {
        Column::ALL
            .iter()
            .map(|column| self.column_summary(*column))
            .collect()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flips and persists the theme; returns the new value.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme_slot.save(self.tasks.store_mut(), &self.theme);
        info!(
            "event=theme_toggle module=service status=ok theme={}",
            self.theme
        );
        self.theme
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    /// Routes a drag lifecycle event; returns the move it applied, if any.
    pub fn handle_drag(&mut self, event: &DragEvent) -> Option<DragCommand> {
        self.drag.handle(event, &mut self.tasks)
    }

    /// Applies a change notification from another board instance.
    ///
    /// Returns whether tasks or theme were replaced.
    pub fn handle_storage_event(&mut self, event: &StorageEvent) -> bool {
        if event.key == self.config.tasks_key {
            return self.tasks.apply_storage_event(event);
        }
        if let Some(theme) = self.theme_slot.decode_event(event) {
            info!(
                "event=theme_external_replace module=service status=ok theme={}",
                theme
            );
            self.theme = theme;
            return true;
        }
        false
    }

    /// Polls the store for foreign writes and applies them.
    ///
    /// Returns the number of events that changed board state. Poll failures
    /// are logged and reported as zero.
    pub fn sync_external_changes(&mut self) -> usize {
        let events = match self.tasks.store_mut().poll_changes() {
            Ok(events) => events,
            Err(err) => {
                warn!(
                    "event=board_sync module=service status=error error={}",
                    err
                );
                return 0;
            }
        };

        let mut applied = 0;
        for event in &events {
            if self.handle_storage_event(event) {
                applied += 1;
            }
        }
        applied
    }
}
