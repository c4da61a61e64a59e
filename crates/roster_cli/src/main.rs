//! RosterDB CLI
//!
//! Command-line tools for an ordered RosterDB store.
//!
//! # Commands
//!
//! - `insert` - Create a record, optionally at a position
//! - `update` - Move a record and/or edit its fields
//! - `delete` - Delete a record and close the gap
//! - `list` - Print the collection in order
//! - `verify` - Check that orders are exactly 1..N
//! - `checkpoint` - Rewrite the journal as one compact entry

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RosterDB command-line tools.
#[derive(Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Ordered collection to operate on
    #[arg(global = true, short, long, default_value = "models")]
    collection: String,

    /// Payload fields that must be unique (comma separated)
    #[arg(global = true, short, long, value_delimiter = ',')]
    unique: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a record
    Insert {
        /// Requested position (appends if missing or out of range)
        #[arg(long)]
        position: Option<String>,

        /// Payload field as key=value (value parsed as JSON when possible)
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// Move a record and/or edit its payload
    Update {
        /// Record ID
        id: String,

        /// New position
        #[arg(long)]
        position: Option<String>,

        /// Payload field as key=value; `key=null` removes the field
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Replace the whole payload instead of merging fields
        #[arg(long)]
        replace: bool,
    },

    /// Delete a record and compact the order
    Delete {
        /// Record ID
        id: String,
    },

    /// List records in order
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify that orders are dense and unique
    Verify,

    /// Rewrite the journal as a single compact entry
    Checkpoint,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let target = commands::Target {
        collection: cli.collection,
        unique: cli.unique,
    };

    match cli.command {
        Commands::Insert { position, fields } => {
            let path = cli.path.ok_or("Store path required for insert")?;
            commands::insert::run(&path, &target, position.as_deref(), &fields)?;
        }
        Commands::Update {
            id,
            position,
            fields,
            replace,
        } => {
            let path = cli.path.ok_or("Store path required for update")?;
            commands::update::run(&path, &target, &id, position.as_deref(), &fields, replace)?;
        }
        Commands::Delete { id } => {
            let path = cli.path.ok_or("Store path required for delete")?;
            commands::delete::run(&path, &target, &id)?;
        }
        Commands::List { format } => {
            let path = cli.path.ok_or("Store path required for list")?;
            commands::list::run(&path, &target, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path, &target)?;
        }
        Commands::Checkpoint => {
            let path = cli.path.ok_or("Store path required for checkpoint")?;
            commands::checkpoint::run(&path)?;
        }
        Commands::Version => {
            println!("RosterDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RosterDB Core v{}", roster_core::VERSION);
        }
    }

    Ok(())
}
