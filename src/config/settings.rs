//! User settings for colcrypt
//!
//! Settings hold deployment constants (the KDF salt and iteration count),
//! the default storage format, and how failed decryptions are written back.
//! They never hold a password or key.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::paths::ColcryptPaths;
use crate::crypto::key_derivation::{
    KeyDerivationParams, DEFAULT_ITERATIONS, DEFAULT_SALT, SALT_LEN,
};
use crate::error::ColcryptError;
use crate::storage::StorageFormat;
use crate::transform::FailurePolicy;

/// Text written in place of a value that failed to decrypt
pub const DEFAULT_FAILURE_MARKER: &str =
    "#DECRYPTION FAILED: incorrect password or corrupted value#";

/// Key derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfSettings {
    /// PBKDF2 iteration count
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// 16-byte salt, standard base64
    #[serde(default = "default_salt")]
    pub salt: String,
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_salt() -> String {
    STANDARD.encode(DEFAULT_SALT)
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            salt: default_salt(),
        }
    }
}

impl KdfSettings {
    /// Decode into key derivation parameters
    pub fn to_params(&self) -> Result<KeyDerivationParams, ColcryptError> {
        let bytes = STANDARD
            .decode(self.salt.trim())
            .map_err(|e| ColcryptError::Config(format!("Invalid salt encoding: {}", e)))?;

        let salt: [u8; SALT_LEN] = bytes.as_slice().try_into().map_err(|_| {
            ColcryptError::Config(format!(
                "Salt must be {} bytes, got {}",
                SALT_LEN,
                bytes.len()
            ))
        })?;

        KeyDerivationParams::with_values(salt, self.iterations)
    }
}

/// User settings for colcrypt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Key derivation constants
    #[serde(default)]
    pub kdf: KdfSettings,

    /// Format used when `--format` is not given
    #[serde(default)]
    pub storage_format: StorageFormat,

    /// What to write when a value fails to decrypt
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Marker text for [`FailurePolicy::Marker`]
    #[serde(default = "default_failure_marker")]
    pub failure_marker: String,

    /// Whether column operations are recorded in the audit log
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_failure_marker() -> String {
    DEFAULT_FAILURE_MARKER.to_string()
}

fn default_audit_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            kdf: KdfSettings::default(),
            storage_format: StorageFormat::default(),
            failure_policy: FailurePolicy::default(),
            failure_marker: default_failure_marker(),
            audit_enabled: default_audit_enabled(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_create(paths: &ColcryptPaths) -> Result<Self, ColcryptError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| ColcryptError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| ColcryptError::Config(format!("Failed to parse settings file: {}", e)))?;

        // Surface a bad salt at startup rather than on first use
        settings.key_params()?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ColcryptPaths) -> Result<(), ColcryptError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ColcryptError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| ColcryptError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Key derivation parameters from the configured constants
    pub fn key_params(&self) -> Result<KeyDerivationParams, ColcryptError> {
        self.kdf.to_params()
    }
}
