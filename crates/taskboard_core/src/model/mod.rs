//! Board domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the stored JSON shape and the in-memory shape identical.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Every task belongs to exactly one `Column`.

pub mod task;
pub mod theme;
