//! JSON query documents
//!
//! ```json
//! {
//!   "where": {"and": [
//!     {"field": "a", "op": "equal", "operands": [{"param": "p1"}]},
//!     {"field": "b", "op": "between", "operands": [{"param": "lo"}, {"param": "hi"}]}
//!   ]},
//!   "params": {"p1": 7, "lo": 1, "hi": 9}
//! }
//! ```
//!
//! Operands may also name a field (`{"field": "c"}`); comparisons reject
//! those the same way the builder API does.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::DomainTypeHandler;
use crate::query::{Operand, Predicate, QueryDomainType, QueryError, QueryResult};

use super::errors::{CliError, CliResult};

/// Query document: an optional predicate and parameter values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDoc {
    #[serde(default, rename = "where")]
    pub where_clause: Option<PredicateDoc>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

/// Predicate node as written in a query document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    untagged,
    expecting = "an 'and' group or a comparison with exactly 'field', 'op' and 'operands'"
)]
pub enum PredicateDoc {
    And(AndDoc),
    Compare(CompareDoc),
}

/// `{"and": [...]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AndDoc {
    pub and: Vec<PredicateDoc>,
}

/// `{"field": ..., "op": ..., "operands": [...]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareDoc {
    pub field: String,
    pub op: String,
    pub operands: Vec<OperandDoc>,
}

/// Right-hand operand of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandDoc {
    Param(String),
    Field(String),
}

impl QueryDoc {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::io_error(format!("Failed to read query '{}': {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| CliError::query_error(format!("Invalid query JSON: {}", e)))
    }
}

impl OperandDoc {
    fn resolve<D>(&self, q: &QueryDomainType<'_, D>) -> QueryResult<Operand>
    where
        D: DomainTypeHandler + ?Sized,
    {
        match self {
            OperandDoc::Param(name) => Ok(q.param(name).into()),
            OperandDoc::Field(name) => Ok(q.get(name)?.into()),
        }
    }
}

impl PredicateDoc {
    /// Builds the predicate through the query builder
    pub fn build<D>(&self, q: &QueryDomainType<'_, D>) -> QueryResult<Predicate>
    where
        D: DomainTypeHandler + ?Sized,
    {
        match self {
            PredicateDoc::And(AndDoc { and }) => {
                let mut parts = and.iter().map(|p| p.build(q));
                let empty = || QueryError::Usage("'and' needs at least one predicate".into());
                let first = parts.next().ok_or_else(empty)??;
                parts.try_fold(first, |acc, next| next.map(|p| acc.and(p)))
            }
            PredicateDoc::Compare(CompareDoc { field, op, operands }) => {
                let property = q.get(field)?;
                let operands = operands
                    .iter()
                    .map(|o| o.resolve(q))
                    .collect::<QueryResult<Vec<Operand>>>()?;

                match (op.as_str(), operands.as_slice()) {
                    ("equal", [o]) => q.equal(&property, o.clone()),
                    ("between", [lo, hi]) => q.between(&property, lo.clone(), hi.clone()),
                    ("greaterThan", [o]) => q.greater_than(&property, o.clone()),
                    ("greaterEqual", [o]) => q.greater_equal(&property, o.clone()),
                    ("lessThan", [o]) => q.less_than(&property, o.clone()),
                    ("lessEqual", [o]) => q.less_equal(&property, o.clone()),
                    ("in", [o]) => q.in_list(&property, o.clone()),
                    (op, found) => Err(QueryError::Usage(format!(
                        "Unknown comparison '{}' with {} operand(s)",
                        op,
                        found.len()
                    ))),
                }
            }
        }
    }
}
