//! Repository layer over the board's persistent storage.
//!
//! # Responsibility
//! - Own the in-memory task collection and its write-through persistence.
//! - Isolate JSON/storage details from the board service.
//!
//! # Invariants
//! - Repository writes must enforce `Task::validate()` before mutating.
//! - Lookup misses are reported as `None`/`false`, never as errors.

pub mod task_repo;
