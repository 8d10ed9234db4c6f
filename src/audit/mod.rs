//! Audit logging for colcrypt
//!
//! Every column operation run from the command line is appended to a
//! line-delimited JSON log (`audit.log` in the configuration directory).
//!
//! ```rust,ignore
//! use colcrypt::audit::{AuditEntry, AuditLogger};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::from_report(run_id, "/data", "people", &report))?;
//! ```

mod entry;
mod logger;

pub use entry::AuditEntry;
pub use logger::AuditLogger;
