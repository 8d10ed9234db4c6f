//! Cryptographic functions for colcrypt
//!
//! PBKDF2-HMAC-SHA256 key derivation feeding Fernet (AES-128-CBC with an
//! HMAC-SHA256 tag) for authenticated encryption of individual text values.

pub mod cipher;
pub mod fernet;
pub mod key_derivation;
pub mod secure_memory;

pub use cipher::{decrypt, encrypt, AuthenticatedCipher, DecryptOutcome, KeyedCipher};
pub use fernet::{DecryptFailure, Fernet};
pub use key_derivation::{derive_key, DerivedKey, KeyDerivationParams};
pub use secure_memory::SecureString;
