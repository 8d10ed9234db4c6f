//! Password-level authenticated encryption of text values
//!
//! [`AuthenticatedCipher`] combines key derivation and Fernet. Encryption
//! returns a text token; decryption returns a [`DecryptOutcome`] instead of
//! an error so that a caller working through many values can record a
//! failure and move on.

use std::time::Duration;

use super::fernet::{current_timestamp, DecryptFailure, Fernet};
use super::key_derivation::{derive_key, KeyDerivationParams};
use crate::error::ColcryptResult;

/// Result of decrypting a single value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// The token authenticated; this is the original text
    Plaintext(String),
    /// The token did not authenticate or decode
    Failed(DecryptFailure),
}

impl DecryptOutcome {
    /// Check if decryption succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Plaintext(_))
    }

    /// Borrow the plaintext if decryption succeeded
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Self::Plaintext(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<String, DecryptFailure> {
        match self {
            Self::Plaintext(text) => Ok(text),
            Self::Failed(failure) => Err(failure),
        }
    }

    fn from_bytes(result: Result<Vec<u8>, DecryptFailure>) -> Self {
        match result {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Self::Plaintext(text),
                Err(_) => Self::Failed(DecryptFailure::InvalidUtf8),
            },
            Err(failure) => Self::Failed(failure),
        }
    }
}

/// Encrypts and decrypts text values under a password
#[derive(Debug, Clone, Default)]
pub struct AuthenticatedCipher {
    params: KeyDerivationParams,
}

impl AuthenticatedCipher {
    /// Create a cipher that derives keys with the given parameters
    pub fn new(params: KeyDerivationParams) -> Self {
        Self { params }
    }

    /// The key derivation parameters in use
    pub fn params(&self) -> &KeyDerivationParams {
        &self.params
    }

    /// Derive the key once and return a cipher bound to it
    ///
    /// Use this when many values share one password.
    pub fn keyed(&self, password: &str) -> KeyedCipher {
        KeyedCipher {
            fernet: Fernet::new(&derive_key(password, &self.params)),
        }
    }

    /// Encrypt a text value under a password
    pub fn encrypt(&self, password: &str, plaintext: &str) -> ColcryptResult<String> {
        self.keyed(password).encrypt(plaintext)
    }

    /// Decrypt a token under a password
    pub fn decrypt(&self, password: &str, token: &str) -> DecryptOutcome {
        self.keyed(password).decrypt(token)
    }

    /// Decrypt a token, treating tokens older than `ttl` as failures
    pub fn decrypt_with_ttl(&self, password: &str, token: &str, ttl: Duration) -> DecryptOutcome {
        self.keyed(password).decrypt_with_ttl(token, ttl)
    }
}

/// A cipher with its key already derived
pub struct KeyedCipher {
    fernet: Fernet,
}

impl KeyedCipher {
    /// Encrypt a text value
    pub fn encrypt(&self, plaintext: &str) -> ColcryptResult<String> {
        self.fernet.encrypt(plaintext.as_bytes())
    }

    /// Decrypt a token
    pub fn decrypt(&self, token: &str) -> DecryptOutcome {
        DecryptOutcome::from_bytes(self.fernet.decrypt(token))
    }

    /// Decrypt a token, treating tokens older than `ttl` as failures
    pub fn decrypt_with_ttl(&self, token: &str, ttl: Duration) -> DecryptOutcome {
        DecryptOutcome::from_bytes(self.fernet.decrypt_with_ttl(
            token,
            ttl.as_secs(),
            current_timestamp(),
        ))
    }
}

/// Encrypt a text value with the default key derivation parameters
pub fn encrypt(password: &str, plaintext: &str) -> ColcryptResult<String> {
    AuthenticatedCipher::default().encrypt(password, plaintext)
}

/// Decrypt a token with the default key derivation parameters
pub fn decrypt(password: &str, token: &str) -> DecryptOutcome {
    AuthenticatedCipher::default().decrypt(password, token)
}
