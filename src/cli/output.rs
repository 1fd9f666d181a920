//! Output formatting for `propedge` commands.
//!
//! Supports two modes: human-readable tables (default) and JSON (--json).

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output mode for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

/// Render rows as a table, or a placeholder when there are none
pub fn table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        "(no results)".to_string()
    } else {
        Table::new(rows).to_string()
    }
}

/// Pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(item: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(item)?);
    Ok(())
}

/// A two-column key/value row
#[derive(Debug, Tabled)]
pub struct FieldRow {
    pub field: String,
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Print a warning message.
pub fn print_warn(msg: &str) {
    eprintln!("\x1b[33m{msg}\x1b[0m");
}
