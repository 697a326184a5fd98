//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use warden_core::error::AppError;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a list of rows in the selected format.
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) -> Result<(), AppError> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
    }
    Ok(())
}

/// Print a single record: key/value lines for tables, the full value for JSON.
pub fn print_record<T: Serialize>(
    record: &T,
    fields: &[(&str, String)],
    format: OutputFormat,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Table => {
            for (key, value) in fields {
                print_kv(key, value);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

pub fn print_warning(msg: &str) {
    eprintln!("⚠ {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}
