//! CLI argument definitions using clap
//!
//! Commands:
//! - keyscan explain --domain <path> --query <path> [--config <path>]
//! - keyscan query --domain <path> --query <path> --data <path> [--config <path>]
//! - keyscan validate --domain <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// keyscan - predicate builder and index selector for key/ordered-index record stores
#[derive(Parser, Debug)]
#[command(name = "keyscan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the access path chosen for a query
    Explain {
        /// Domain definition (JSON)
        #[arg(long)]
        domain: PathBuf,

        /// Query document (JSON)
        #[arg(long)]
        query: PathBuf,

        /// Planner configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run a query against rows loaded into the in-memory store
    Query {
        /// Domain definition (JSON)
        #[arg(long)]
        domain: PathBuf,

        /// Query document (JSON) with parameter values
        #[arg(long)]
        query: PathBuf,

        /// Rows to load (JSON array of objects)
        #[arg(long)]
        data: PathBuf,

        /// Planner configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a domain definition and print its indexes
    Validate {
        /// Domain definition (JSON)
        #[arg(long)]
        domain: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
