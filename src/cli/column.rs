//! Column encryption CLI commands
//!
//! `encrypt`, `decrypt` and `verify` all read a table, run the column
//! transform, report per-column counts, and append to the audit log.

use tracing::warn;
use uuid::Uuid;

use super::password::read_password;
use super::ColumnArgs;
use crate::audit::{AuditEntry, AuditLogger};
use crate::config::{ColcryptPaths, Settings};
use crate::error::{ColcryptError, ColcryptResult};
use crate::storage::open_store;
use crate::transform::{ColumnTransform, FailurePolicy, Operation, TransformReport};

/// Encrypt columns in place
pub fn handle_encrypt_command(
    paths: &ColcryptPaths,
    settings: &Settings,
    args: ColumnArgs,
) -> ColcryptResult<()> {
    let transform = ColumnTransform::from_settings(settings)?;
    run(paths, settings, &transform, Operation::Encrypt, args)?;
    Ok(())
}

/// Decrypt columns in place
pub fn handle_decrypt_command(
    paths: &ColcryptPaths,
    settings: &Settings,
    args: ColumnArgs,
    keep_ciphertext: bool,
) -> ColcryptResult<()> {
    let mut transform = ColumnTransform::from_settings(settings)?;
    if keep_ciphertext {
        transform = transform.with_failure_policy(FailurePolicy::KeepCiphertext);
    }

    let report = run(paths, settings, &transform, Operation::Decrypt, args)?;
    if !report.is_clean() {
        match transform.failure_policy() {
            FailurePolicy::Marker => println!(
                "{} value(s) could not be decrypted and were replaced with the failure marker.",
                report.total_failures()
            ),
            FailurePolicy::KeepCiphertext => println!(
                "{} value(s) could not be decrypted and were left encrypted.",
                report.total_failures()
            ),
        }
    }
    Ok(())
}

/// Check that columns decrypt, without modifying the table
pub fn handle_verify_command(
    paths: &ColcryptPaths,
    settings: &Settings,
    args: ColumnArgs,
) -> ColcryptResult<()> {
    let transform = ColumnTransform::from_settings(settings)?;
    let report = run(paths, settings, &transform, Operation::Verify, args)?;

    if report.is_clean() {
        println!("All values decrypt with this password.");
        Ok(())
    } else {
        Err(ColcryptError::VerificationFailed {
            failures: report.total_failures(),
        })
    }
}

fn run(
    paths: &ColcryptPaths,
    settings: &Settings,
    transform: &ColumnTransform,
    operation: Operation,
    args: ColumnArgs,
) -> ColcryptResult<TransformReport> {
    let format = args.table.format.unwrap_or(settings.storage_format);
    let store = open_store(format, &args.table.location);
    let table_name = args.table.table.as_str();

    // Fail on a missing table before asking for a password
    if !store.table_exists(table_name)? {
        return Err(ColcryptError::TableNotFound(table_name.to_string()));
    }

    let password = read_password(operation == Operation::Encrypt)?;

    let report = match operation {
        Operation::Encrypt => {
            transform.encrypt_in_store(store.as_ref(), table_name, &args.columns, Some(&password))?
        }
        Operation::Decrypt => {
            transform.decrypt_in_store(store.as_ref(), table_name, &args.columns, Some(&password))?
        }
        Operation::Verify => {
            transform.verify_in_store(store.as_ref(), table_name, &args.columns, Some(&password))?
        }
    };

    println!("{}", report);

    if settings.audit_enabled {
        let entry = AuditEntry::from_report(
            Uuid::new_v4(),
            store.location().display().to_string(),
            table_name,
            &report,
        );
        // The table has already been written at this point
        if let Err(e) = AuditLogger::new(paths.audit_log()).log(&entry) {
            warn!(error = %e, "failed to write audit entry");
        }
    }

    Ok(report)
}
