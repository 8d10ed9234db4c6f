//! Path management for colcrypt
//!
//! ## Path Resolution Order
//!
//! 1. `COLCRYPT_CONFIG_DIR` environment variable (if set)
//! 2. The platform configuration directory (`~/.config/colcrypt` on Linux,
//!    `~/Library/Application Support/colcrypt` on macOS, `%APPDATA%\colcrypt`
//!    on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::ColcryptError;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "COLCRYPT_CONFIG_DIR";

/// Manages all paths used by colcrypt
#[derive(Debug, Clone)]
pub struct ColcryptPaths {
    /// Base directory for settings and the audit log
    base_dir: PathBuf,
}

impl ColcryptPaths {
    /// Resolve the configuration directory
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and the
    /// override variable is unset.
    pub fn new() -> Result<Self, ColcryptError> {
        let base_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => ProjectDirs::from("", "", "colcrypt")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    ColcryptError::Config("Could not determine configuration directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create ColcryptPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), ColcryptError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ColcryptError::Io(format!("Failed to create config directory: {}", e)))
    }
}
