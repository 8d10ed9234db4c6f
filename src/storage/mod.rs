//! Table storage
//!
//! A store is opened over a location and holds any number of named tables.
//! Three formats are supported:
//!
//! - `csv`: a directory with one file per table, every cell read back as text
//! - `json`: a directory with one `{"columns": [...], "rows": [[...], ...]}`
//!   file per table, preserving cell types
//! - `sqlite`: a database file, one SQL table per table
//!
//! All writes are atomic and row order is preserved.

pub mod csv_store;
pub mod file_io;
pub mod json_store;
pub mod sqlite_store;

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ColcryptError, ColcryptResult};
use crate::table::Table;

pub use csv_store::CsvStore;
pub use json_store::JsonStore;
pub use sqlite_store::SqliteStore;

/// What to do when writing a table that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the existing table
    Replace,
    /// Add rows to the existing table (columns must match)
    Append,
    /// Refuse to write if the table exists
    FailIfExists,
}

/// On-disk table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    #[default]
    Csv,
    Json,
    Sqlite,
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageFormat::Csv => write!(f, "csv"),
            StorageFormat::Json => write!(f, "json"),
            StorageFormat::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl StorageFormat {
    /// File extension for tables (or the database) in this format
    pub fn extension(&self) -> &'static str {
        match self {
            StorageFormat::Csv => "csv",
            StorageFormat::Json => "json",
            StorageFormat::Sqlite => "db",
        }
    }
}

/// A location holding named tables
pub trait TableStore {
    /// The directory (file formats) or database file (SQLite) behind this store
    fn location(&self) -> &Path;

    /// Read a whole table
    fn read_table(&self, name: &str) -> ColcryptResult<Table>;

    /// Write a whole table according to `mode`
    fn write_table(&self, table: &Table, name: &str, mode: WriteMode) -> ColcryptResult<()>;

    /// Check whether a table exists
    fn table_exists(&self, name: &str) -> ColcryptResult<bool>;
}

/// Open a store of the given format at `location`
pub fn open_store(format: StorageFormat, location: impl Into<PathBuf>) -> Box<dyn TableStore> {
    match format {
        StorageFormat::Csv => Box::new(CsvStore::new(location)),
        StorageFormat::Json => Box::new(JsonStore::new(location)),
        StorageFormat::Sqlite => Box::new(SqliteStore::new(location)),
    }
}

/// Reject table names that could escape the location directory
pub fn validate_table_name(name: &str) -> ColcryptResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(ColcryptError::Validation(format!(
            "Invalid table name '{}': use letters, digits, '_' or '-'",
            name
        )))
    }
}

/// Resolve the path of a table file inside a location
pub(crate) fn table_path(location: &Path, name: &str, format: StorageFormat) -> ColcryptResult<PathBuf> {
    validate_table_name(name)?;
    Ok(location.join(format!("{}.{}", name, format.extension())))
}

/// Work out the table that should end up on disk for a write
pub(crate) fn resolve_write<'a, F>(
    name: &str,
    incoming: &'a Table,
    mode: WriteMode,
    exists: bool,
    load_existing: F,
) -> ColcryptResult<Cow<'a, Table>>
where
    F: FnOnce() -> ColcryptResult<Table>,
{
    match (mode, exists) {
        (WriteMode::FailIfExists, true) => Err(ColcryptError::TableExists(name.to_string())),
        (WriteMode::Append, true) => {
            let mut existing = load_existing()?;
            existing.append(incoming)?;
            Ok(Cow::Owned(existing))
        }
        _ => Ok(Cow::Borrowed(incoming)),
    }
}
