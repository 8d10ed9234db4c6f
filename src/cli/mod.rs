//! CLI command handlers
//!
//! This module bridges clap argument parsing with the column transform and
//! storage layers.

pub mod column;
pub mod password;
pub mod show;

use std::path::PathBuf;

use clap::Args;

use crate::storage::StorageFormat;

pub use column::{handle_decrypt_command, handle_encrypt_command, handle_verify_command};
pub use password::{read_password, PASSWORD_ENV};
pub use show::{handle_history_command, handle_show_command};

/// Which table to operate on
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Directory holding the table files, or the SQLite database file
    #[arg(short, long, env = "COLCRYPT_LOCATION")]
    pub location: PathBuf,

    /// Table name (file name without extension, or SQL table name)
    #[arg(short, long)]
    pub table: String,

    /// Storage format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<StorageFormat>,
}

/// A table plus the columns to transform
#[derive(Args, Debug, Clone)]
pub struct ColumnArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Column to transform (repeat the flag or separate names with commas)
    #[arg(short, long = "column", value_delimiter = ',', required = true)]
    pub columns: Vec<String>,
}
