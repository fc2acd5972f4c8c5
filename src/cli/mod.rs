//! CLI module for keyscan
//!
//! Provides command-line interface for:
//! - explain: show the access path chosen for a query document
//! - query: run a query document against rows in the in-memory store
//! - validate: check a domain definition

mod args;
mod commands;
mod document;
mod errors;

pub use args::{Cli, Command};
pub use commands::{explain, query, run, run_command, validate};
pub use document::{AndDoc, CompareDoc, OperandDoc, PredicateDoc, QueryDoc};
pub use errors::{CliError, CliErrorCode, CliResult};
