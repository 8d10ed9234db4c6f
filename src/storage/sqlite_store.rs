//! SQLite table store
//!
//! The location is a database file and each table is an SQL table in it.
//! Writes run in one transaction. Replacing a table drops and recreates it
//! with column types inferred from the cells; appending inserts into the
//! existing table, whose columns must match by name and order.

use std::path::{Path, PathBuf};

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use super::{TableStore, WriteMode};
use crate::error::{ColcryptError, ColcryptResult};
use crate::table::{Column, Table, Value};

/// Stores tables in one SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn connect(&self) -> ColcryptResult<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Connection::open(&self.path)?)
    }
}

impl TableStore for SqliteStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read_table(&self, name: &str) -> ColcryptResult<Table> {
        check_name(name)?;
        if !self.table_exists(name)? {
            return Err(ColcryptError::TableNotFound(name.to_string()));
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote(name)))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut table = Table::with_columns(names.iter())?;

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(names.len());
            for (i, column) in names.iter().enumerate() {
                cells.push(from_sql(row.get_ref(i)?, column)?);
            }
            table.push_row(cells)?;
        }

        debug!(table = name, rows = table.row_count(), "read sqlite table");
        Ok(table)
    }

    fn write_table(&self, table: &Table, name: &str, mode: WriteMode) -> ColcryptResult<()> {
        check_name(name)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let exists = table_exists_in(&tx, name)?;
        match (mode, exists) {
            (WriteMode::FailIfExists, true) => {
                return Err(ColcryptError::TableExists(name.to_string()));
            }
            (WriteMode::Append, true) => {
                let existing = existing_columns(&tx, name)?;
                if existing != table.column_names() {
                    return Err(ColcryptError::Validation(format!(
                        "Cannot append to '{}': columns {:?} do not match {:?}",
                        name,
                        table.column_names(),
                        existing
                    )));
                }
            }
            (WriteMode::Replace, true) => {
                tx.execute(&format!("DROP TABLE {}", quote(name)), [])?;
                create_table(&tx, table, name)?;
            }
            (_, false) => create_table(&tx, table, name)?,
        }

        insert_rows(&tx, table, name)?;
        tx.commit()?;

        debug!(table = name, rows = table.row_count(), ?mode, "wrote sqlite table");
        Ok(())
    }

    fn table_exists(&self, name: &str) -> ColcryptResult<bool> {
        // Opening would create an empty database file
        if !self.path.exists() {
            return Ok(false);
        }
        table_exists_in(&self.connect()?, name)
    }
}

fn check_name(name: &str) -> ColcryptResult<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(ColcryptError::Validation(format!(
            "Invalid table name '{}'",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Quote an SQL identifier
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn table_exists_in(conn: &Connection, name: &str) -> ColcryptResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn existing_columns(conn: &Connection, name: &str) -> ColcryptResult<Vec<String>> {
    let stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 0", quote(name)))?;
    Ok(stmt.column_names().into_iter().map(String::from).collect())
}

fn create_table(conn: &Connection, table: &Table, name: &str) -> ColcryptResult<()> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|column| format!("{} {}", quote(column.name()), declared_type(column)))
        .collect();
    conn.execute(
        &format!("CREATE TABLE {} ({})", quote(name), columns.join(", ")),
        [],
    )?;
    Ok(())
}

fn insert_rows(conn: &Connection, table: &Table, name: &str) -> ColcryptResult<()> {
    let names: Vec<String> = table.column_names().into_iter().map(quote).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(name),
        names.join(", "),
        placeholders.join(", ")
    ))?;

    for row in table.rows() {
        let cells = row
            .iter()
            .map(|value| to_sql(value))
            .collect::<ColcryptResult<Vec<_>>>()?;
        stmt.execute(params_from_iter(cells))?;
    }
    Ok(())
}

/// Column type for a new table, from the cells it will hold
fn declared_type(column: &Column) -> &'static str {
    let mut declared = None;
    for value in column.values() {
        let kind = match value {
            Value::Null => continue,
            Value::Integer(_) | Value::Unsigned(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
        };
        declared = match (declared, kind) {
            (None, kind) => Some(kind),
            (Some(a), b) if a == b => Some(a),
            (Some("INTEGER"), "REAL") | (Some("REAL"), "INTEGER") => Some("REAL"),
            // Mixed text and numbers: no affinity, cells keep their own type
            _ => return "",
        };
    }
    declared.unwrap_or("TEXT")
}

fn to_sql(value: &Value) -> ColcryptResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Unsigned(u) => SqlValue::Integer(i64::try_from(*u).map_err(|_| {
            ColcryptError::Storage(format!("Integer {} is too large for SQLite", u))
        })?),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
    })
}

fn from_sql(value: ValueRef<'_>, column: &str) -> ColcryptResult<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Integer(i)),
        ValueRef::Real(r) => Ok(Value::Real(r)),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(Value::Text)
            .map_err(|_| ColcryptError::Storage(format!("Column '{}' holds invalid UTF-8 text", column))),
        ValueRef::Blob(_) => Err(ColcryptError::Storage(format!(
            "Column '{}' holds binary data, which is not supported",
            column
        ))),
    }
}
