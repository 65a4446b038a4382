//! LoreStore CLI
//!
//! Maintenance tools for LoreStore data directories.
//!
//! # Commands
//!
//! - `inspect` - Summarize the document and its backups
//! - `verify` - Check that both documents decode cleanly
//! - `repair` - Salvage or reset corrupt documents, keeping backups
//! - `auto-links` - Print the derived links
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LoreStore command-line maintenance tools.
#[derive(Parser)]
#[command(name = "lorestore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the document and its backups
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that both documents decode cleanly
    Verify,

    /// Salvage or reset corrupt documents, keeping backups
    Repair {
        /// Only report what would happen
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Print the derived links
    AutoLinks {
        /// Restrict matching to these field keys (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Data directory required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Data directory required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Repair { dry_run } => {
            let path = cli.path.ok_or("Data directory required for repair")?;
            commands::repair::run(&path, dry_run)?;
        }
        Commands::AutoLinks { fields, format } => {
            let path = cli.path.ok_or("Data directory required for auto-links")?;
            commands::auto_links::run(&path, &fields, &format)?;
        }
        Commands::Version => {
            println!("LoreStore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("LoreStore Core v{}", lorestore_core::VERSION);
        }
    }

    Ok(())
}
