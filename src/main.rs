use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use colcrypt::cli::{
    handle_decrypt_command, handle_encrypt_command, handle_history_command, handle_show_command,
    handle_verify_command, ColumnArgs, TableArgs,
};
use colcrypt::config::{ColcryptPaths, Settings};
use colcrypt::telemetry::init_logging;

#[derive(Parser)]
#[command(
    name = "colcrypt",
    version,
    about = "Password-based column encryption for tabular data",
    long_about = "colcrypt encrypts selected columns of a CSV or JSON table in place. \
                  Every cell becomes an independent authenticated token, so a wrong \
                  password or a tampered value is detected per cell on decryption. \
                  The password is read from COLCRYPT_PASSWORD or prompted for."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt columns of a table in place
    Encrypt(ColumnArgs),

    /// Decrypt columns of a table in place
    Decrypt {
        #[command(flatten)]
        args: ColumnArgs,

        /// Leave values that fail to decrypt as ciphertext instead of the failure marker
        #[arg(long)]
        keep_ciphertext: bool,
    },

    /// Check that columns decrypt with a password, without writing
    Verify(ColumnArgs),

    /// Print the first rows of a table
    Show {
        #[command(flatten)]
        table: TableArgs,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show recent operations from the audit log
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Only show operations on this table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Show current configuration and paths
    Config {
        /// Write the settings file with the current values if it does not exist
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let paths = ColcryptPaths::new()?;
    let settings = Settings::load_or_create(&paths).context("Failed to load settings")?;

    match cli.command {
        Commands::Encrypt(args) => {
            handle_encrypt_command(&paths, &settings, args).context("Encryption failed")?;
        }
        Commands::Decrypt {
            args,
            keep_ciphertext,
        } => {
            handle_decrypt_command(&paths, &settings, args, keep_ciphertext)
                .context("Decryption failed")?;
        }
        Commands::Verify(args) => {
            handle_verify_command(&paths, &settings, args).context("Verification failed")?;
        }
        Commands::Show { table, limit } => {
            handle_show_command(&settings, table, limit)?;
        }
        Commands::History { limit, table } => {
            handle_history_command(&paths, limit, table.as_deref())?;
        }
        Commands::Config { init } => {
            if init {
                if paths.settings_file().exists() {
                    println!("Settings file already exists, leaving it unchanged.");
                } else {
                    settings.save(&paths).context("Failed to write settings")?;
                    println!("Wrote {}", paths.settings_file().display());
                }
                println!();
            }

            println!("colcrypt Configuration");
            println!("======================");
            println!("Config directory: {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  KDF iterations: {}", settings.kdf.iterations);
            println!("  Storage format: {}", settings.storage_format);
            println!("  Failure policy: {:?}", settings.failure_policy);
            println!("  Audit enabled:  {}", settings.audit_enabled);
        }
    }

    Ok(())
}
