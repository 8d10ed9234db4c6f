//! Table preview and audit history commands

use tabled::{builder::Builder, settings::Style};

use super::TableArgs;
use crate::audit::AuditLogger;
use crate::config::{ColcryptPaths, Settings};
use crate::error::ColcryptResult;
use crate::storage::open_store;
use crate::table::Table;

/// Longest cell rendered before truncation
const MAX_CELL_WIDTH: usize = 40;

/// Print the first `limit` rows of a table
pub fn handle_show_command(settings: &Settings, args: TableArgs, limit: usize) -> ColcryptResult<()> {
    let format = args.format.unwrap_or(settings.storage_format);
    let store = open_store(format, &args.location);
    let table = store.read_table(&args.table)?;

    println!("{}", render_table(&table, limit));
    if table.row_count() > limit {
        println!("... {} more row(s)", table.row_count() - limit);
    }
    Ok(())
}

/// Print recent audit log entries, optionally for one table only
pub fn handle_history_command(
    paths: &ColcryptPaths,
    limit: usize,
    table: Option<&str>,
) -> ColcryptResult<()> {
    let entries = AuditLogger::new(paths.audit_log()).read_recent(limit, table)?;

    if entries.is_empty() {
        println!("No operations recorded yet.");
        return Ok(());
    }

    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}

/// Render up to `limit` rows as a text table
pub fn render_table(table: &Table, limit: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.column_names());
    for row in table.rows().take(limit) {
        builder.push_record(row.iter().map(|value| truncate(&value.to_string(), MAX_CELL_WIDTH)));
    }

    let mut rendered = builder.build();
    rendered.with(Style::rounded());
    rendered.to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
