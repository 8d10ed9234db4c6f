//! Configuration module for colcrypt
//!
//! - Platform-aware path resolution
//! - Settings persistence (KDF constants, storage format, failure policy)

pub mod paths;
pub mod settings;

pub use paths::ColcryptPaths;
pub use settings::Settings;
