//! Index selection
//!
//! Selection priority (strict order):
//! 1. Unique index whose columns are all pinned by equality, most columns first
//! 2. Usable index with the most bound columns, scanned over its bound
//!    prefix; on a tie the tail decides (equal, then range or in-list per
//!    `TieBreak`). Unique indexes not fully pinned compete here too.
//! 3. Table scan
//!
//! Remaining ties go to the earliest declared index.
//!
//! After selection the predicate tree is replayed against the scan: leaves
//! consumed by the chosen bound prefix set bounds, every other leaf becomes
//! a filter condition.

use std::collections::BTreeSet;

use crate::config::{PlannerConfig, TieBreak};
use crate::domain::{DomainTypeHandler, IndexKind};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{BoundType, FilterGroup, ScanOperation, ScanTarget};

use super::candidate::{CandidateIndex, CandidateSet, ColumnMark, LeafId, RangeEnd};
use super::errors::{QueryError, QueryResult};
use super::params::ParameterBindings;
use super::predicate::{field_handler, Predicate};

/// Access path chosen for one execution
#[derive(Debug, Clone, PartialEq)]
pub enum ScanPlan {
    UniqueLookup(CandidateIndex),
    IndexScan(CandidateIndex),
    TableScan,
}

impl ScanPlan {
    pub fn index(&self) -> Option<&CandidateIndex> {
        match self {
            ScanPlan::UniqueLookup(c) | ScanPlan::IndexScan(c) => Some(c),
            ScanPlan::TableScan => None,
        }
    }

    pub fn target(&self) -> ScanTarget {
        match self {
            ScanPlan::UniqueLookup(c) => ScanTarget::UniqueLookup {
                index: c.name().to_string(),
            },
            ScanPlan::IndexScan(c) => ScanTarget::IndexScan {
                index: c.name().to_string(),
            },
            ScanPlan::TableScan => ScanTarget::TableScan,
        }
    }

    pub fn bound_column_count(&self) -> usize {
        self.index().map_or(0, CandidateIndex::bound_column_count)
    }

    pub fn range_or_in_tail(&self) -> bool {
        self.index().is_some_and(CandidateIndex::range_or_in_tail)
    }

    /// Leaves turned into bounds; the rest become filters
    pub fn consumed_leaves(&self) -> BTreeSet<LeafId> {
        self.index()
            .map(CandidateIndex::consumed_leaves)
            .unwrap_or_default()
    }

    pub fn is_table_scan(&self) -> bool {
        matches!(self, ScanPlan::TableScan)
    }
}

/// Picks the access path and replays the predicate tree against it
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexSelector {
    tie_break: TieBreak,
}

impl IndexSelector {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            tie_break: config.tie_break,
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Chooses the access path for a marked candidate set.
    ///
    /// Deterministic: same candidates, same plan.
    pub fn select(&self, candidates: &CandidateSet) -> ScanPlan {
        // Priority 1: fully pinned unique index
        let unique = best_by(
            candidates
                .usable()
                .filter(|c| c.kind() == IndexKind::Unique && c.is_fully_pinned()),
            |c| (c.bound_column_count(), 0),
        );
        if let Some(c) = unique {
            return ScanPlan::UniqueLookup(c.clone());
        }

        // Priority 2: longest bound prefix, then best tail
        let scan = best_by(candidates.usable(), |c| (c.bound_column_count(), self.tail_rank(c)));
        if let Some(c) = scan {
            return ScanPlan::IndexScan(c.clone());
        }

        let considered = candidates.len().to_string();
        log_event_with_fields(Event::TableScanFallback, &[("candidates", considered.as_str())]);
        ScanPlan::TableScan
    }

    fn tail_rank(&self, candidate: &CandidateIndex) -> u8 {
        match (candidate.tail_mark(), self.tie_break) {
            (Some(ColumnMark::Equal(_)), _) => 2,
            (Some(ColumnMark::Range { .. }), TieBreak::PreferRange)
            | (Some(ColumnMark::InList(_)), TieBreak::PreferInList) => 1,
            _ => 0,
        }
    }

    /// Pushes bounds and filters for `plan` into `op`.
    ///
    /// Returns the number of leaves evaluated as filters.
    pub fn materialize<D>(
        &self,
        plan: &ScanPlan,
        predicate: &Predicate,
        domain: &D,
        bindings: &ParameterBindings,
        op: &mut dyn ScanOperation,
    ) -> QueryResult<usize>
    where
        D: DomainTypeHandler + ?Sized,
    {
        let leaves = predicate.leaves();

        if let Some(index) = plan.index() {
            for (position, mark) in index.bound_marks().iter().enumerate() {
                set_bound(&leaves, *mark, position, domain, bindings, op)?;
            }
        }

        let consumed = plan.consumed_leaves();
        let remaining: Vec<&Predicate> = leaves
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(&LeafId(*i)))
            .map(|(_, leaf)| *leaf)
            .collect();

        if !remaining.is_empty() {
            let filter = op.filter();
            filter.begin(FilterGroup::And)?;
            for leaf in &remaining {
                leaf.emit_filter(domain, bindings, filter)?;
            }
            filter.end()?;
        }

        Ok(remaining.len())
    }
}

/// First item with the greatest key
fn best_by<'c, I, K>(
    candidates: I,
    key: impl Fn(&CandidateIndex) -> K,
) -> Option<&'c CandidateIndex>
where
    I: Iterator<Item = &'c CandidateIndex>,
    K: Ord,
{
    let mut best: Option<(&CandidateIndex, K)> = None;
    for c in candidates {
        let k = key(c);
        if best.as_ref().map_or(true, |(_, b)| k > *b) {
            best = Some((c, k));
        }
    }
    best.map(|(c, _)| c)
}

fn leaf_at<'p>(leaves: &[&'p Predicate], leaf: LeafId) -> QueryResult<&'p Predicate> {
    leaves
        .get(leaf.0)
        .copied()
        .ok_or_else(|| QueryError::Usage(format!("predicate has no leaf {}", leaf.0)))
}

fn set_bound<D>(
    leaves: &[&Predicate],
    mark: ColumnMark,
    position: usize,
    domain: &D,
    bindings: &ParameterBindings,
    op: &mut dyn ScanOperation,
) -> QueryResult<()>
where
    D: DomainTypeHandler + ?Sized,
{
    let missing = |leaf: &Predicate| {
        QueryError::Usage(format!("'{}' cannot bound an index column this way", leaf.op_name()))
    };

    match mark {
        ColumnMark::Unmarked => Ok(()),
        ColumnMark::Equal(id) => {
            let leaf = leaf_at(leaves, id)?;
            let param = leaf.point_parameter().ok_or_else(|| missing(leaf))?;
            field_handler(domain, leaf)?.set_equal_bound(
                bindings.require(param.name())?,
                position,
                op,
            )
        }
        ColumnMark::InList(id) => {
            let leaf = leaf_at(leaves, id)?;
            let param = leaf.point_parameter().ok_or_else(|| missing(leaf))?;
            field_handler(domain, leaf)?.set_in_list_bound(
                bindings.require_list(param.name())?,
                position,
                op,
            )
        }
        ColumnMark::Range { lower, upper } => {
            if let Some(RangeEnd { leaf: id, strict }) = lower {
                let leaf = leaf_at(leaves, id)?;
                let param = leaf.lower_parameter().ok_or_else(|| missing(leaf))?;
                field_handler(domain, leaf)?.set_range_bound(
                    bindings.require(param.name())?,
                    BoundType::lower(strict),
                    position,
                    op,
                )?;
            }
            if let Some(RangeEnd { leaf: id, strict }) = upper {
                let leaf = leaf_at(leaves, id)?;
                let param = leaf.upper_parameter().ok_or_else(|| missing(leaf))?;
                field_handler(domain, leaf)?.set_range_bound(
                    bindings.require(param.name())?,
                    BoundType::upper(strict),
                    position,
                    op,
                )?;
            }
            Ok(())
        }
    }
}
