//! JSON table store
//!
//! Tables are stored row-major with an explicit column list. JSON keeps
//! cell types, so integer and real cells survive a round trip and are
//! reported as unsupported by the column transform.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{file_io, resolve_write, table_path, StorageFormat, TableStore, WriteMode};
use crate::error::{ColcryptError, ColcryptResult};
use crate::table::{Table, Value};

/// On-disk shape of a JSON table
#[derive(Debug, Serialize, Deserialize)]
struct JsonTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl JsonTable {
    fn from_table(table: &Table) -> Self {
        Self {
            columns: table.column_names().into_iter().map(String::from).collect(),
            rows: table
                .rows()
                .map(|row| row.into_iter().cloned().collect())
                .collect(),
        }
    }

    fn into_table(self) -> ColcryptResult<Table> {
        let mut table = Table::with_columns(self.columns)?;
        for row in self.rows {
            table.push_row(row)?;
        }
        Ok(table)
    }
}

/// Stores each table as `<location>/<name>.json`
#[derive(Debug, Clone)]
pub struct JsonStore {
    location: PathBuf,
}

impl JsonStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    fn path(&self, name: &str) -> ColcryptResult<PathBuf> {
        table_path(&self.location, name, StorageFormat::Json)
    }

    fn load(&self, name: &str, path: &Path) -> ColcryptResult<Table> {
        if !path.exists() {
            return Err(ColcryptError::TableNotFound(name.to_string()));
        }

        let stored: JsonTable = file_io::read_json_required(path)?;
        let table = stored.into_table()?;
        debug!(table = name, rows = table.row_count(), "read json table");
        Ok(table)
    }
}

impl TableStore for JsonStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn read_table(&self, name: &str) -> ColcryptResult<Table> {
        let path = self.path(name)?;
        self.load(name, &path)
    }

    fn write_table(&self, table: &Table, name: &str, mode: WriteMode) -> ColcryptResult<()> {
        let path = self.path(name)?;
        let table = resolve_write(name, table, mode, path.exists(), || self.load(name, &path))?;

        file_io::write_json_atomic(&path, &JsonTable::from_table(&table))?;

        debug!(table = name, rows = table.row_count(), ?mode, "wrote json table");
        Ok(())
    }

    fn table_exists(&self, name: &str) -> ColcryptResult<bool> {
        Ok(self.path(name)?.exists())
    }
}
