//! Core domain logic for the task board.
//! This crate is the single source of truth for board invariants.

pub mod config;
pub mod db;
pub mod drag;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{BoardConfig, ConfigError, DEFAULT_TASKS_KEY, DEFAULT_THEME_KEY};
pub use drag::{
    transition, DragCommand, DragCoordinator, DragEvent, DragState, DropTarget, TaskLocator,
};
pub use filter::{parse_priority_filter, visible, TaskFilter, UnknownPriority};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    initials, Column, Priority, Task, TaskDraft, TaskField, TaskId, TaskLimits, TaskPatch,
    TaskValidationError,
};
pub use model::theme::Theme;
pub use repo::task_repo::TaskRepository;
pub use service::board_service::{Board, ColumnSummary};
pub use store::{
    KeyValueStore, MemoryKeyValueStore, PersistentSlot, SlotError, SqliteKeyValueStore,
    StorageEvent, StoreError, StoreResult,
};

/// Minimal health check used by the CLI smoke run.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
