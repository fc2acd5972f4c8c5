//! CLI command implementations
//!
//! Commands write their output to the supplied writer; logs go to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::config::PlannerConfig;
use crate::domain::{DomainFieldHandler, DomainType, DomainTypeHandler};
use crate::query::{ExplainPlan, Query, QueryDomainType, QueryResult};
use crate::store::MemoryStore;

use super::args::{Cli, Command};
use super::document::QueryDoc;
use super::errors::{CliError, CliResult};

/// Parses arguments and runs the command against stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(cli.command, &mut out)
}

pub fn run_command<W: Write>(command: Command, out: &mut W) -> CliResult<()> {
    match command {
        Command::Explain {
            domain,
            query: query_path,
            config,
        } => explain(&domain, &query_path, config.as_deref(), out),
        Command::Query {
            domain,
            query: query_path,
            data,
            config,
        } => query(&domain, &query_path, &data, config.as_deref(), out),
        Command::Validate { domain } => validate(&domain, out),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<PlannerConfig> {
    let config = match path {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    config.apply_logging();
    Ok(config)
}

fn build_query<'d>(
    domain: &'d DomainType,
    doc: &QueryDoc,
    config: PlannerConfig,
) -> QueryResult<Query<'d, DomainType>> {
    let q = QueryDomainType::new(domain).with_config(config);
    let q = match &doc.where_clause {
        Some(where_clause) => {
            let predicate = where_clause.build(&q)?;
            q.where_clause(predicate)?
        }
        None => q,
    };

    let mut query = q.create_query();
    for (name, value) in &doc.params {
        query.bind(name, value.clone());
    }
    Ok(query)
}

/// Prints the explain plan; predicates that fail to build print as rejected
pub fn explain<W: Write>(
    domain_path: &Path,
    query_path: &Path,
    config_path: Option<&Path>,
    out: &mut W,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let domain = DomainType::load(domain_path)?;
    let doc = QueryDoc::load(query_path)?;

    let plan = match build_query(&domain, &doc, config) {
        Ok(query) => query.explain(),
        Err(err) => ExplainPlan::from_error(domain.name(), &err),
    };
    write!(out, "{}", plan)?;
    Ok(())
}

/// Loads rows into a fresh in-memory table, runs the query, prints one JSON record per line
pub fn query<W: Write>(
    domain_path: &Path,
    query_path: &Path,
    data_path: &Path,
    config_path: Option<&Path>,
    out: &mut W,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let domain = DomainType::load(domain_path)?;
    let doc = QueryDoc::load(query_path)?;

    let content = fs::read_to_string(data_path).map_err(|e| {
        CliError::io_error(format!("Failed to read data '{}': {}", data_path.display(), e))
    })?;
    let rows: Vec<Value> = serde_json::from_str(&content).map_err(|e| {
        CliError::data_error(format!("Invalid data '{}': {}", data_path.display(), e))
    })?;

    let mut store = MemoryStore::new();
    store.create_table(&domain);
    for row in rows {
        store.insert(domain.name(), row)?;
    }

    let result = build_query(&domain, &doc, config)?.execute(&store)?;
    for record in result.iter() {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Prints the validated domain's columns and indexes as JSON
pub fn validate<W: Write>(domain_path: &Path, out: &mut W) -> CliResult<()> {
    let domain = DomainType::load(domain_path)?;

    let columns: Vec<Value> = domain
        .columns()
        .iter()
        .map(|c| json!({"name": c.name(), "type": c.column_type().type_name()}))
        .collect();
    let indexes: Vec<Value> = domain
        .indexes()
        .iter()
        .map(|i| json!({"name": i.name, "kind": i.kind.as_str(), "columns": i.columns}))
        .collect();

    let summary = json!({
        "domain": domain.name(),
        "columns": columns,
        "indexes": indexes,
    });
    serde_json::to_writer_pretty(&mut *out, &summary)?;
    writeln!(out)?;
    Ok(())
}
