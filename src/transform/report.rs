//! Batch results

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a column transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Encrypt,
    Decrypt,
    /// Decrypt without writing anything back
    Verify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Encrypt => write!(f, "encrypt"),
            Operation::Decrypt => write!(f, "decrypt"),
            Operation::Verify => write!(f, "verify"),
        }
    }
}

/// Per-column counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    /// Text cells that were encrypted or successfully decrypted
    pub transformed: usize,
    /// Null cells left as they were
    pub skipped_nulls: usize,
    /// Cells that failed to decrypt
    pub failures: usize,
}

impl ColumnReport {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transformed: 0,
            skipped_nulls: 0,
            failures: 0,
        }
    }
}

/// Outcome of transforming a set of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformReport {
    pub operation: Operation,
    pub rows: usize,
    /// True when no password was supplied and the table was left untouched
    pub skipped: bool,
    pub columns: Vec<ColumnReport>,
}

impl TransformReport {
    /// Total number of cells that failed to decrypt
    pub fn total_failures(&self) -> usize {
        self.columns.iter().map(|c| c.failures).sum()
    }

    /// Total number of cells transformed
    pub fn total_transformed(&self) -> usize {
        self.columns.iter().map(|c| c.transformed).sum()
    }

    /// Check if every cell was handled without a decryption failure
    pub fn is_clean(&self) -> bool {
        self.total_failures() == 0
    }
}

impl fmt::Display for TransformReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return write!(f, "{}: skipped (no password), {} rows unchanged", self.operation, self.rows);
        }

        write!(f, "{}: {} rows", self.operation, self.rows)?;
        for column in &self.columns {
            write!(
                f,
                "\n  {}: {} transformed, {} null, {} failed",
                column.name, column.transformed, column.skipped_nulls, column.failures
            )?;
        }
        Ok(())
    }
}
