//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, filter and drag calls into board-level APIs.
//! - Keep the presentation layer decoupled from storage details.

pub mod board_service;
