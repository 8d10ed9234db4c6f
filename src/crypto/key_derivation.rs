//! Key derivation using PBKDF2-HMAC-SHA256
//!
//! Derives a 32-byte key from a password. The salt is a deployment constant
//! rather than a per-record random value, so the same password always yields
//! the same key and previously encrypted columns can be decrypted with the
//! password alone. The all-zero default salt matches existing data; a
//! deployment that wants keys distinct from other installations sets its own
//! constant salt in the settings file.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ColcryptError, ColcryptResult};

/// Length of the salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes
pub const KEY_LEN: usize = 32;

/// Default salt: 16 zero bytes
pub const DEFAULT_SALT: [u8; SALT_LEN] = [0u8; SALT_LEN];

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Parameters for key derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Constant salt mixed into every derivation
    pub salt: [u8; SALT_LEN],
    /// PBKDF2 iteration count
    pub iterations: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            salt: DEFAULT_SALT,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KeyDerivationParams {
    /// Create params with the default salt and iteration count
    pub fn new() -> Self {
        Self::default()
    }

    /// Create params with specific values
    ///
    /// # Errors
    ///
    /// Returns an error if `iterations` is zero.
    pub fn with_values(salt: [u8; SALT_LEN], iterations: u32) -> ColcryptResult<Self> {
        if iterations == 0 {
            return Err(ColcryptError::Config(
                "PBKDF2 iteration count must be at least 1".to_string(),
            ));
        }
        Ok(Self { salt, iterations })
    }
}

/// A derived encryption key
///
/// The first half is the HMAC signing key and the second half the AES key
/// when used with [`super::Fernet`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes
    pub fn from_bytes(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Parse the URL-safe base64 text form produced by [`DerivedKey::encode`]
    pub fn from_encoded(encoded: &str) -> ColcryptResult<Self> {
        let mut bytes = URL_SAFE
            .decode(encoded.trim())
            .map_err(|e| ColcryptError::Encryption(format!("Invalid key encoding: {}", e)))?;

        if bytes.len() != KEY_LEN {
            let len = bytes.len();
            bytes.zeroize();
            return Err(ColcryptError::Encryption(format!(
                "Invalid key length: expected {}, got {}",
                KEY_LEN, len
            )));
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self { key })
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Encode the key as URL-safe base64 with padding (44 characters)
    pub fn encode(&self) -> String {
        URL_SAFE.encode(self.key)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive an encryption key from a password
///
/// Total over its input: any password, including the empty string, yields a key.
pub fn derive_key(password: &str, params: &KeyDerivationParams) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &params.salt, params.iterations, &mut key);
    DerivedKey { key }
}
