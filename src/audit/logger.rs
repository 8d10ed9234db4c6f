//! Append-only JSON-lines audit log
//!
//! A line that fails to parse (for example one cut short by a crash during
//! an append) is skipped with a warning so it cannot hide the rest of the
//! history.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::error::ColcryptResult;

use super::entry::AuditEntry;

pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one entry
    ///
    /// The line is written with a single call so concurrent runs never
    /// interleave partial entries.
    pub fn log(&self, entry: &AuditEntry) -> ColcryptResult<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(&line)?;
        file.sync_data()?;
        Ok(())
    }

    /// The last `count` entries, oldest first, optionally only those for one table
    pub fn read_recent(&self, count: usize, table: Option<&str>) -> ColcryptResult<Vec<AuditEntry>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut window = VecDeque::with_capacity(count.min(256));

        self.scan(|entry| {
            if table.is_some_and(|t| t != entry.table) {
                return;
            }
            if window.len() == count {
                window.pop_front();
            }
            window.push_back(entry);
        })?;

        Ok(window.into())
    }

    fn scan(&self, mut visit: impl FnMut(AuditEntry)) -> ColcryptResult<()> {
        let file = match File::open(&self.log_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => visit(entry),
                Err(e) => warn!(line = index + 1, error = %e, "skipping unreadable audit entry"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{ColumnReport, Operation, TransformReport};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (logger, temp_dir)
    }

    fn read_all(logger: &AuditLogger) -> Vec<AuditEntry> {
        logger.read_recent(usize::MAX, None).unwrap()
    }

    fn entry_for(table: &str) -> AuditEntry {
        let report = TransformReport {
            operation: Operation::Encrypt,
            rows: 2,
            skipped: false,
            columns: vec![ColumnReport {
                name: "email".into(),
                transformed: 2,
                skipped_nulls: 0,
                failures: 0,
            }],
        };
        AuditEntry::from_report(Uuid::new_v4(), "/data", table, &report)
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = create_test_logger();
        logger.log(&entry_for("people")).unwrap();

        let entries = read_all(&logger);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Encrypt);
        assert_eq!(entries[0].table, "people");
    }

    #[test]
    fn test_log_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("nested/dir/audit.log"));
        logger.log(&entry_for("people")).unwrap();
        assert_eq!(read_all(&logger).len(), 1);
    }

    #[test]
    fn test_read_recent() {
        let (logger, _temp) = create_test_logger();
        for i in 0..10 {
            logger.log(&entry_for(&format!("t{}", i))).unwrap();
        }

        let recent = logger.read_recent(3, None).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].table, "t7");
        assert_eq!(recent[2].table, "t9");

        assert!(logger.read_recent(0, None).unwrap().is_empty());
    }

    #[test]
    fn test_read_recent_for_one_table() {
        let (logger, _temp) = create_test_logger();
        for table in ["people", "orders", "people", "orders", "people"] {
            logger.log(&entry_for(table)).unwrap();
        }

        let recent = logger.read_recent(2, Some("orders")).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|e| e.table == "orders"));

        assert_eq!(logger.read_recent(10, Some("people")).unwrap().len(), 3);
        assert!(logger.read_recent(10, Some("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();
        assert!(read_all(&logger).is_empty());
        assert!(logger.read_recent(5, None).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_lines_are_skipped() {
        let (logger, _temp) = create_test_logger();
        logger.log(&entry_for("first")).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&logger.log_path)
            .unwrap()
            .write_all(b"not json\n{\"timestamp\":\n")
            .unwrap();
        logger.log(&entry_for("last")).unwrap();

        let entries = read_all(&logger);
        let tables: Vec<&str> = entries.iter().map(|e| e.table.as_str()).collect();
        assert_eq!(tables, vec!["first", "last"]);
    }
}
