//! Logging setup
//!
//! Diagnostics go to stderr through `tracing`. The filter comes from
//! `COLCRYPT_LOG` when set, otherwise from the `-v` count on the command line.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ColcryptError, ColcryptResult};

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "COLCRYPT_LOG";

/// Map a `-v` count to a default filter directive
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber
pub fn init_logging(verbosity: u8) -> ColcryptResult<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| ColcryptError::Config(format!("Failed to initialise logging: {}", e)))
}
