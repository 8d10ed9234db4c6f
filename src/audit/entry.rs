//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transform::{Operation, TransformReport};

/// A single audit log entry
///
/// Records one column operation on one table. Entries carry counts only;
/// passwords, keys and cell contents are never recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation completed (UTC)
    pub timestamp: DateTime<Utc>,

    /// Identifies one invocation of the tool
    pub run_id: Uuid,

    /// Operation performed
    pub operation: Operation,

    /// Directory holding the table
    pub location: String,

    /// Table name
    pub table: String,

    /// Columns that were requested
    pub columns: Vec<String>,

    /// Rows in the table
    pub rows: usize,

    /// Cells that failed to decrypt
    #[serde(default)]
    pub failures: usize,

    /// True when no password was given and nothing changed
    #[serde(default)]
    pub skipped: bool,
}

impl AuditEntry {
    /// Build an entry from a finished transform
    pub fn from_report(
        run_id: Uuid,
        location: impl Into<String>,
        table: impl Into<String>,
        report: &TransformReport,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id,
            operation: report.operation,
            location: location.into(),
            table: table.into(),
            columns: report.columns.iter().map(|c| c.name.clone()).collect(),
            rows: report.rows,
            failures: report.total_failures(),
            skipped: report.skipped,
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {}/{} [{}] rows={}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation.to_string().to_uppercase(),
            self.location,
            self.table,
            self.columns.join(", "),
            self.rows
        );

        if self.skipped {
            output.push_str(" (skipped)");
        } else if self.failures > 0 {
            output.push_str(&format!(" failures={}", self.failures));
        }

        output
    }
}
