//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt a table on failure.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ColcryptError, ColcryptResult};

/// Read JSON from a file, returning an error if the file doesn't exist
pub fn read_json_required<T, P>(path: P) -> ColcryptResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Err(ColcryptError::Storage(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)
        .map_err(|e| ColcryptError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| ColcryptError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write a file atomically (write to temp, then rename)
///
/// `write_fn` receives a buffered writer over the temp file. The target is
/// either completely replaced or left as it was.
pub fn write_atomic<P, F>(path: P, write_fn: F) -> ColcryptResult<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> ColcryptResult<()>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ColcryptError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Temp file in the same directory so the rename stays on one filesystem
    let temp_path = temp_path_for(path);

    let file = File::create(&temp_path)
        .map_err(|e| ColcryptError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    let result = write_fn(&mut writer)
        .and_then(|_| {
            writer
                .flush()
                .map_err(|e| ColcryptError::Storage(format!("Failed to flush data: {}", e)))
        })
        .and_then(|_| {
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| ColcryptError::Storage(format!("Failed to sync data: {}", e)))
        });

    if let Err(e) = result {
        drop(writer);
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    drop(writer);

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ColcryptError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Write JSON to a file atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> ColcryptResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_atomic(path, |writer| {
        serde_json::to_writer_pretty(writer, data)
            .map_err(|e| ColcryptError::Storage(format!("Failed to serialize data: {}", e)))
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("table"));
    name.push(".tmp");
    path.with_file_name(name)
}
