//! Column transform
//!
//! Applies the authenticated cipher to every cell of the named columns of a
//! table. The key is derived once per call and shared by every cell.
//!
//! Input problems are caught before any cell is modified: unknown or
//! repeated column names, and numeric cells in a target column, are errors
//! and leave the table untouched. A value that fails to decrypt is not an
//! error; it is counted and replaced according to the [`FailurePolicy`] so
//! the rest of the batch still goes through.

pub mod report;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::settings::{Settings, DEFAULT_FAILURE_MARKER};
use crate::crypto::{AuthenticatedCipher, DecryptOutcome, KeyDerivationParams, SecureString};
use crate::error::{ColcryptError, ColcryptResult};
use crate::storage::{TableStore, WriteMode};
use crate::table::{Table, Value};

pub use report::{ColumnReport, Operation, TransformReport};

/// What to write in place of a value that failed to decrypt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Replace the value with the configured marker text
    #[default]
    Marker,
    /// Leave the ciphertext in place so it can be retried
    KeepCiphertext,
}

/// Encrypts or decrypts whole columns
#[derive(Debug, Clone)]
pub struct ColumnTransform {
    cipher: AuthenticatedCipher,
    failure_policy: FailurePolicy,
    failure_marker: String,
}

impl Default for ColumnTransform {
    fn default() -> Self {
        Self::new(KeyDerivationParams::default())
    }
}

impl ColumnTransform {
    /// Create a transform deriving keys with `params`
    pub fn new(params: KeyDerivationParams) -> Self {
        Self {
            cipher: AuthenticatedCipher::new(params),
            failure_policy: FailurePolicy::default(),
            failure_marker: DEFAULT_FAILURE_MARKER.to_string(),
        }
    }

    /// Create a transform from persisted settings
    pub fn from_settings(settings: &Settings) -> ColcryptResult<Self> {
        Ok(Self::new(settings.key_params()?)
            .with_failure_policy(settings.failure_policy)
            .with_failure_marker(settings.failure_marker.clone()))
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.failure_marker = marker.into();
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn failure_marker(&self) -> &str {
        &self.failure_marker
    }

    /// Encrypt every text cell of `columns`
    ///
    /// `password = None` leaves the table unchanged.
    pub fn encrypt_columns(
        &self,
        table: &mut Table,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        self.apply(Operation::Encrypt, table, columns, password)
    }

    /// Decrypt every text cell of `columns`
    ///
    /// `password = None` leaves the table unchanged.
    pub fn decrypt_columns(
        &self,
        table: &mut Table,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        self.apply(Operation::Decrypt, table, columns, password)
    }

    /// Count the cells of `columns` that would fail to decrypt
    pub fn verify_columns(
        &self,
        table: &Table,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        check_columns(table, columns)?;
        let Some(password) = password else {
            return Ok(skipped_report(Operation::Verify, table, columns));
        };
        check_text_cells(table, columns)?;

        let keyed = self.cipher.keyed(password.as_str());
        let mut reports = Vec::with_capacity(columns.len());

        for name in columns {
            let column = table
                .column(name)
                .ok_or_else(|| ColcryptError::column_not_found(name))?;
            let mut report = ColumnReport::new(name.as_str());

            for value in column.values() {
                match value.as_text() {
                    Some(token) if keyed.decrypt(token).is_success() => report.transformed += 1,
                    Some(_) => report.failures += 1,
                    None => report.skipped_nulls += 1,
                }
            }

            reports.push(report);
        }

        Ok(TransformReport {
            operation: Operation::Verify,
            rows: table.row_count(),
            skipped: false,
            columns: reports,
        })
    }

    /// Read a table, encrypt `columns`, and write it back in place
    pub fn encrypt_in_store(
        &self,
        store: &dyn TableStore,
        table_name: &str,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        self.apply_in_store(Operation::Encrypt, store, table_name, columns, password)
    }

    /// Read a table, decrypt `columns`, and write it back in place
    ///
    /// Values that fail are handled by the failure policy, unless no value
    /// decrypts at all: then nothing is written and
    /// [`ColcryptError::NothingDecrypted`] is returned.
    pub fn decrypt_in_store(
        &self,
        store: &dyn TableStore,
        table_name: &str,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        self.apply_in_store(Operation::Decrypt, store, table_name, columns, password)
    }

    /// Read a table and check `columns` decrypt, without writing anything
    pub fn verify_in_store(
        &self,
        store: &dyn TableStore,
        table_name: &str,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        let table = store.read_table(table_name)?;
        let report = self.verify_columns(&table, columns, password)?;
        info!(
            table = table_name,
            rows = report.rows,
            failures = report.total_failures(),
            "verified columns"
        );
        Ok(report)
    }

    fn apply_in_store(
        &self,
        operation: Operation,
        store: &dyn TableStore,
        table_name: &str,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        let mut table = store.read_table(table_name)?;
        let report = self.apply(operation, &mut table, columns, password)?;

        // Nothing authenticated: leave the stored tokens as they are
        if operation == Operation::Decrypt
            && report.total_transformed() == 0
            && report.total_failures() > 0
        {
            warn!(
                table = table_name,
                failures = report.total_failures(),
                "no value decrypted, table left unchanged"
            );
            return Err(ColcryptError::NothingDecrypted {
                failures: report.total_failures(),
            });
        }

        if !report.skipped {
            store.write_table(&table, table_name, WriteMode::Replace)?;
        }

        info!(
            %operation,
            table = table_name,
            rows = report.rows,
            failures = report.total_failures(),
            "transformed columns"
        );
        Ok(report)
    }

    fn apply(
        &self,
        operation: Operation,
        table: &mut Table,
        columns: &[String],
        password: Option<&SecureString>,
    ) -> ColcryptResult<TransformReport> {
        check_columns(table, columns)?;
        let Some(password) = password else {
            debug!(%operation, "no password supplied, leaving columns unchanged");
            return Ok(skipped_report(operation, table, columns));
        };
        check_text_cells(table, columns)?;

        let rows = table.row_count();
        let keyed = self.cipher.keyed(password.as_str());
        let mut reports = Vec::with_capacity(columns.len());

        for name in columns {
            let column = table
                .column_mut(name)
                .ok_or_else(|| ColcryptError::column_not_found(name))?;
            let mut report = ColumnReport::new(name.as_str());

            for value in column.values_mut() {
                let Value::Text(text) = value else {
                    report.skipped_nulls += 1;
                    continue;
                };

                match operation {
                    Operation::Encrypt => {
                        *text = keyed.encrypt(text)?;
                        report.transformed += 1;
                    }
                    Operation::Decrypt | Operation::Verify => match keyed.decrypt(text) {
                        DecryptOutcome::Plaintext(plaintext) => {
                            *text = plaintext;
                            report.transformed += 1;
                        }
                        DecryptOutcome::Failed(_) => {
                            report.failures += 1;
                            if self.failure_policy == FailurePolicy::Marker {
                                *text = self.failure_marker.clone();
                            }
                        }
                    },
                }
            }

            if report.failures > 0 {
                warn!(column = %name, failures = report.failures, "values failed to decrypt");
            }
            debug!(column = %name, transformed = report.transformed, "column done");
            reports.push(report);
        }

        Ok(TransformReport {
            operation,
            rows,
            skipped: false,
            columns: reports,
        })
    }
}

fn skipped_report(operation: Operation, table: &Table, columns: &[String]) -> TransformReport {
    TransformReport {
        operation,
        rows: table.row_count(),
        skipped: true,
        columns: columns.iter().map(|name| ColumnReport::new(name.as_str())).collect(),
    }
}

fn check_columns(table: &Table, columns: &[String]) -> ColcryptResult<()> {
    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            return Err(ColcryptError::Validation(format!(
                "Column '{}' listed more than once",
                name
            )));
        }
        if !table.has_column(name) {
            return Err(ColcryptError::column_not_found(name.as_str()));
        }
    }
    Ok(())
}

fn check_text_cells(table: &Table, columns: &[String]) -> ColcryptResult<()> {
    for name in columns {
        let Some(column) = table.column(name) else {
            return Err(ColcryptError::column_not_found(name.as_str()));
        };
        let bad = column
            .values()
            .iter()
            .enumerate()
            .find(|(_, value)| !matches!(value, Value::Text(_) | Value::Null));

        if let Some((row, value)) = bad {
            return Err(ColcryptError::UnsupportedValue {
                column: name.clone(),
                row,
                kind: value.kind(),
            });
        }
    }
    Ok(())
}
