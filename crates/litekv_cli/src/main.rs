//! litekv CLI
//!
//! Command-line tools for litekv stores.
//!
//! # Commands
//!
//! - `inspect` - Display per-table record counts and file sizes
//! - `get` / `set` / `delete` / `all` - Read and write records
//! - `clean` / `clear` - Remove valueless records or whole tables
//! - `migrate` - Convert every table to another data style
//! - `keygen` - Generate an encryption secret and IV

mod commands;

use clap::{Parser, Subcommand};
use litekv_core::{DataStyle, EncryptionConfig, EncryptionMode, StoreConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// litekv command-line store tools.
#[derive(Parser)]
#[command(name = "litekv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long, default_value = "./database")]
    path: PathBuf,

    /// Configured tables, comma separated
    #[arg(global = true, short, long, value_delimiter = ',')]
    tables: Vec<String>,

    /// Table representation (mapping, sequence)
    #[arg(global = true, short, long, default_value = "mapping")]
    style: DataStyle,

    /// Maximum number of records across all tables
    #[arg(global = true, long, default_value_t = 100)]
    limit: usize,

    /// 32-character encryption secret; enables field encryption
    #[arg(global = true, long, requires = "iv")]
    secret: Option<String>,

    /// Initialization vector as 32 hex digits
    #[arg(global = true, long, requires = "secret")]
    iv: Option<String>,

    /// Encrypted fields (value, key, both)
    #[arg(global = true, long, default_value = "value")]
    mode: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display per-table statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print one record
    Get {
        /// Table name
        table: String,
        /// Record key
        key: String,
        /// Record id
        #[arg(long)]
        id: Option<String>,
    },

    /// Write one record
    Set {
        /// Table name
        table: String,
        /// Record key
        key: String,
        /// Value as JSON; anything that does not parse is stored as a string
        value: String,
        /// Record id
        #[arg(long)]
        id: Option<String>,
        /// Time to live in milliseconds
        #[arg(long)]
        ttl_ms: Option<u64>,
    },

    /// Delete one record
    Delete {
        /// Table name
        table: String,
        /// Record key
        key: String,
        /// Record id
        #[arg(long)]
        id: Option<String>,
    },

    /// Print every record in a table
    All {
        /// Table name
        table: String,
    },

    /// Remove records without a value
    Clean {
        /// Table name; all tables when omitted
        table: Option<String>,
    },

    /// Remove every record
    Clear {
        /// Table name; all tables when omitted
        table: Option<String>,
    },

    /// Convert every table to another data style
    Migrate {
        /// Target style (mapping, sequence)
        #[arg(long)]
        to: DataStyle,
    },

    /// Generate an encryption secret and IV
    Keygen,

    /// Show version information
    Version,
}

impl Cli {
    fn store_config(&self) -> Result<StoreConfig, Box<dyn std::error::Error>> {
        let mut config = StoreConfig::new()
            .path(&self.path)
            .data_style(self.style)
            .limit(self.limit);
        if !self.tables.is_empty() {
            config = config.tables(self.tables.iter().cloned());
        }
        if let (Some(secret), Some(iv)) = (&self.secret, &self.iv) {
            let iv = hex::decode(iv).map_err(|e| format!("invalid --iv: {e}"))?;
            config = config.encryption(EncryptionConfig::new(
                secret,
                iv,
                EncryptionMode::parse(&self.mode),
            ));
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.store_config()?;
    match cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(&config, &format)?;
        }
        Commands::Get { table, key, id } => {
            commands::records::get(&config, &table, &key, id)?;
        }
        Commands::Set {
            table,
            key,
            value,
            id,
            ttl_ms,
        } => {
            commands::records::set(&config, &table, &key, &value, id, ttl_ms)?;
        }
        Commands::Delete { table, key, id } => {
            commands::records::delete(&config, &table, &key, id)?;
        }
        Commands::All { table } => {
            commands::records::all(&config, &table)?;
        }
        Commands::Clean { table } => {
            commands::records::clean(&config, table.as_deref())?;
        }
        Commands::Clear { table } => {
            commands::records::clear(&config, table.as_deref())?;
        }
        Commands::Migrate { to } => {
            commands::migrate::run(config, to)?;
        }
        Commands::Keygen => {
            commands::keygen::run();
        }
        Commands::Version => {
            println!("litekv CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("litekv Core v{}", litekv_core::VERSION);
        }
    }

    Ok(())
}
