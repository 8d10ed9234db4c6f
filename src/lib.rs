//! colcrypt - Password-based column encryption for tabular data
//!
//! This library encrypts and decrypts selected columns of a table in place.
//! Each cell becomes an independent authenticated token (Fernet format)
//! under a key derived from a password with PBKDF2-HMAC-SHA256.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `crypto`: Key derivation, token format and the password cipher
//! - `table`: In-memory columnar tables
//! - `storage`: CSV and JSON table stores
//! - `transform`: Column encryption, decryption and verification
//! - `config`: Configuration and path management
//! - `audit`: Append-only operation log
//! - `cli`: Command handlers
//! - `telemetry`: Logging setup
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use colcrypt::crypto::SecureString;
//! use colcrypt::storage::{open_store, StorageFormat};
//! use colcrypt::transform::ColumnTransform;
//!
//! let store = open_store(StorageFormat::Csv, "data");
//! let password = SecureString::from("secret");
//! let report = ColumnTransform::default().encrypt_in_store(
//!     store.as_ref(),
//!     "customers",
//!     &["email".to_string()],
//!     Some(&password),
//! )?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;
pub mod table;
pub mod telemetry;
pub mod transform;

pub use error::ColcryptError;
