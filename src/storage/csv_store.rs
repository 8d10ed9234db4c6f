//! CSV table store
//!
//! CSV carries no types, so every cell is read back as text. Null cells are
//! written as empty fields.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{file_io, resolve_write, table_path, StorageFormat, TableStore, WriteMode};
use crate::error::{ColcryptError, ColcryptResult};
use crate::table::{Table, Value};

/// Stores each table as `<location>/<name>.csv`
#[derive(Debug, Clone)]
pub struct CsvStore {
    location: PathBuf,
}

impl CsvStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    fn path(&self, name: &str) -> ColcryptResult<PathBuf> {
        table_path(&self.location, name, StorageFormat::Csv)
    }

    fn load(&self, name: &str, path: &Path) -> ColcryptResult<Table> {
        if !path.exists() {
            return Err(ColcryptError::TableNotFound(name.to_string()));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let mut table = Table::with_columns(headers.iter())?;

        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(|field| Value::Text(field.to_string())).collect())?;
        }

        debug!(table = name, rows = table.row_count(), "read csv table");
        Ok(table)
    }
}

impl TableStore for CsvStore {
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

        file_io::write_atomic(&path, |writer| {
            let mut csv_writer = csv::Writer::from_writer(writer);
            csv_writer.write_record(table.column_names())?;
            for row in table.rows() {
                csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
            }
            csv_writer.flush()?;
            Ok(())
        })?;

        debug!(table = name, rows = table.row_count(), ?mode, "wrote csv table");
        Ok(())
    }

    fn table_exists(&self, name: &str) -> ColcryptResult<bool> {
        Ok(self.path(name)?.exists())
    }
}
