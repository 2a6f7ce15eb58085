//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskboard_core` linkage without any presentation layer.
//! - Print a deterministic per-column summary of a board database.

use std::process::ExitCode;
use taskboard_core::{Board, BoardConfig, SqliteKeyValueStore};

const DEFAULT_DB_FILE_NAME: &str = "taskboard.sqlite3";

fn main() -> ExitCode {
    println!("taskboard_core ping={}", taskboard_core::ping());
    println!("taskboard_core version={}", taskboard_core::core_version());

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_FILE_NAME.to_string());

    let store = match SqliteKeyValueStore::open(&db_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("failed to open board database `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };
    let board = match Board::open(store, BoardConfig::default()) {
        Ok(board) => board,
        Err(err) => {
            eprintln!("invalid board config: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("board db={db_path} theme={}", board.theme());
    for summary in board.column_summaries() {
        println!(
            "column id={} title=\"{}\" total={}",
            summary.column, summary.title, summary.total
        );
    }
    ExitCode::SUCCESS
}
