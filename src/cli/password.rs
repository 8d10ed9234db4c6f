//! Password input
//!
//! Passwords are never taken from command-line arguments, where they would
//! show up in shell history and process listings. They come from the
//! `COLCRYPT_PASSWORD` environment variable or an interactive prompt with
//! hidden input.

use crate::crypto::SecureString;
use crate::error::{ColcryptError, ColcryptResult};

/// Environment variable holding the password for non-interactive use
pub const PASSWORD_ENV: &str = "COLCRYPT_PASSWORD";

/// Read the password from the environment or prompt for it
///
/// With `confirm`, an interactive prompt asks twice and repeats until both
/// entries match.
pub fn read_password(confirm: bool) -> ColcryptResult<SecureString> {
    if let Some(password) = password_from_env() {
        return Ok(password);
    }

    loop {
        let first = prompt_password("Password: ")?;
        if !confirm {
            return Ok(first);
        }

        let second = prompt_password("Confirm password: ")?;
        if first == second {
            return Ok(first);
        }

        println!("Passwords do not match. Please try again.");
    }
}

fn password_from_env() -> Option<SecureString> {
    std::env::var(PASSWORD_ENV).ok().map(SecureString::from)
}

/// Prompt for a password (hidden input)
fn prompt_password(prompt: &str) -> ColcryptResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| ColcryptError::Io(format!("Failed to read password: {}", e)))
}
