//! Explain plan output
//!
//! Deterministic, human-readable description of the access path a query
//! would take and why every other index was passed over.

use std::fmt;

use super::candidate::{CandidateIndex, ColumnMark, LeafId};
use super::errors::QueryError;
use super::facade::QueryPlan;
use super::predicate::Predicate;

/// How one declared index came out of marking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReport {
    pub name: String,
    pub kind: String,
    pub status: String,
    pub bound_columns: usize,
    /// Exclusion reason (if excluded)
    pub reason: Option<String>,
}

impl CandidateReport {
    fn from_candidate(c: &CandidateIndex) -> Self {
        Self {
            name: c.name().to_string(),
            kind: c.kind().as_str().to_string(),
            status: c.status().as_str().to_string(),
            bound_columns: if c.is_usable() { c.bound_column_count() } else { 0 },
            reason: c
                .exclusion()
                .map(|e| format!("{}: {}", e.code().code(), e)),
        }
    }
}

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainPlan {
    /// Whether the query could be planned
    pub accepted: bool,
    pub domain: String,
    /// UNIQUE_LOOKUP, INDEX_SCAN or TABLE_SCAN
    pub access: Option<String>,
    pub selected_index: Option<String>,
    /// One entry per bound index column, in position order
    pub bounds: Vec<String>,
    /// Leaves evaluated row by row
    pub filters: Vec<String>,
    pub candidates: Vec<CandidateReport>,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    pub fn from_plan(domain: &str, plan: &QueryPlan, predicate: Option<&Predicate>) -> Self {
        let leaves = predicate.map(Predicate::leaves).unwrap_or_default();
        let describe = |id: LeafId| {
            leaves
                .get(id.0)
                .map(|l| l.to_string())
                .unwrap_or_else(|| format!("leaf {}", id.0))
        };

        let bounds: Vec<String> = plan
            .scan
            .index()
            .map(|index| {
                index
                    .bound_marks()
                    .iter()
                    .enumerate()
                    .map(|(position, mark)| {
                        let from: Vec<String> = mark.leaves().into_iter().map(&describe).collect();
                        format!(
                            "{} {} ({}) <- {}",
                            position,
                            index.columns()[position],
                            mark_label(mark),
                            from.join(", ")
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let consumed = plan.scan.consumed_leaves();
        let filters: Vec<String> = leaves
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(&LeafId(*i)))
            .map(|(_, l)| l.to_string())
            .collect();

        let target = plan.scan.target();
        Self {
            accepted: true,
            domain: domain.to_string(),
            access: Some(target.as_str().to_string()),
            selected_index: target.index().map(str::to_string),
            bounds,
            filters,
            candidates: plan.candidates.iter().map(CandidateReport::from_candidate).collect(),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    pub fn from_error(domain: &str, err: &QueryError) -> Self {
        Self {
            accepted: false,
            domain: domain.to_string(),
            access: None,
            selected_index: None,
            bounds: Vec::new(),
            filters: Vec::new(),
            candidates: Vec::new(),
            rejection_reason: Some(err.to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }
}

fn mark_label(mark: &ColumnMark) -> String {
    match mark {
        ColumnMark::Range { lower, upper } => {
            let open = match lower {
                Some(end) if end.strict => "(",
                Some(_) => "[",
                None => "(-inf",
            };
            let close = match upper {
                Some(end) if end.strict => ")",
                Some(_) => "]",
                None => "+inf)",
            };
            format!("range {}..{}", open, close)
        }
        other => other.as_str().to_string(),
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Domain: {}", self.domain)?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(access) = &self.access {
            writeln!(f, "Access: {}", access)?;
        }
        if let Some(index) = &self.selected_index {
            writeln!(f, "Index: {}", index)?;
        }
        if !self.bounds.is_empty() {
            writeln!(f, "Bounds:")?;
            for bound in &self.bounds {
                writeln!(f, "  - {}", bound)?;
            }
        }
        if !self.filters.is_empty() {
            writeln!(f, "Filters:")?;
            for filter in &self.filters {
                writeln!(f, "  - {}", filter)?;
            }
        }
        if !self.candidates.is_empty() {
            writeln!(f, "Candidates:")?;
            for c in &self.candidates {
                write!(f, "  - {} ({}): {}", c.name, c.kind, c.status)?;
                if c.bound_columns > 0 {
                    write!(f, ", {} bound", c.bound_columns)?;
                }
                if let Some(reason) = &c.reason {
                    write!(f, ", {}", reason)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
