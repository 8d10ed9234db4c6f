//! In-memory columnar tables
//!
//! A [`Table`] is an ordered list of named [`Column`]s of equal length.
//! Row order is the order of values within each column and is preserved by
//! every storage backend.

pub mod value;

pub use value::Value;

use crate::error::{ColcryptError, ColcryptResult};

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    /// Create a column from a name and its values
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create a column of text cells
    pub fn text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, values.into_iter().map(|v| Value::Text(v.into())).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A table of named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table from columns
    ///
    /// # Errors
    ///
    /// Returns a validation error if two columns share a name or the columns
    /// have different lengths.
    pub fn new(columns: Vec<Column>) -> ColcryptResult<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(ColcryptError::Validation(format!(
                    "Duplicate column name: {}",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(ColcryptError::Validation(format!(
                    "Column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    first.len()
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Create an empty table with the given column names
    pub fn with_columns<I, S>(names: I) -> ColcryptResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| Column::new(name, Vec::new()))
                .collect(),
        )
    }

    /// Append one row, given in column order
    pub fn push_row(&mut self, row: Vec<Value>) -> ColcryptResult<()> {
        if row.len() != self.columns.len() {
            return Err(ColcryptError::Validation(format!(
                "Row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }

        for (column, value) in self.columns.iter_mut().zip(row) {
            column.values.push(value);
        }

        Ok(())
    }

    /// Append all rows of another table with identical column names
    pub fn append(&mut self, other: &Table) -> ColcryptResult<()> {
        if self.column_names() != other.column_names() {
            return Err(ColcryptError::Validation(format!(
                "Cannot append table with columns [{}] to table with columns [{}]",
                other.column_names().join(", "),
                self.column_names().join(", ")
            )));
        }

        for (column, incoming) in self.columns.iter_mut().zip(&other.columns) {
            column.values.extend(incoming.values.iter().cloned());
        }

        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Number of rows (zero for a table without columns)
    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Borrow one row in column order
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count()).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::text("name", ["alice", "bob"]),
            Column::new("age", vec![Value::Integer(30), Value::Integer(41)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_table() {
        let table = sample();
        assert_eq!(table.column_names(), vec!["name", "age"]);
        assert_eq!(table.row_count(), 2);
        assert!(table.has_column("age"));
        assert!(!table.has_column("email"));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Table::new(vec![Column::text("a", ["1"]), Column::text("a", ["2"])]);
        assert!(matches!(result, Err(ColcryptError::Validation(_))));
    }

    #[test]
    fn test_uneven_columns_rejected() {
        let result = Table::new(vec![Column::text("a", ["1", "2"]), Column::text("b", ["1"])]);
        assert!(matches!(result, Err(ColcryptError::Validation(_))));
    }

    #[test]
    fn test_push_row() {
        let mut table = Table::with_columns(["a", "b"]).unwrap();
        table.push_row(vec!["x".into(), Value::Null]).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.row(0).unwrap(), vec![&Value::from("x"), &Value::Null]);

        assert!(table.push_row(vec!["only one".into()]).is_err());
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_rows_in_order() {
        let table = sample();
        let names: Vec<String> = table.rows().map(|row| row[0].to_string()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_append() {
        let mut table = sample();
        table.append(&sample()).unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column("name").unwrap().values()[2], Value::from("alice"));
    }

    #[test]
    fn test_append_mismatched_columns() {
        let mut table = sample();
        let other = Table::new(vec![Column::text("name", ["carol"])]).unwrap();
        assert!(table.append(&other).is_err());
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::default();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.rows().count(), 0);
    }
}
