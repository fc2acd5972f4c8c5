//! Candidate indexes and their per-column bound marks
//!
//! One `CandidateIndex` exists per declared index per query. The marking
//! pass records, for every column position, which predicate leaf bounds it
//! and how. A candidate is usable when its marks form a contiguous run from
//! position 0 in which every mark except the last is an equality.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{DomainTypeHandler, IndexDef, IndexId, IndexKind, IndexPosition};
use crate::observability::{log_event_with_fields, Event};

use super::errors::{QueryError, QueryResult};

/// Depth-first, left-to-right ordinal of a predicate leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub usize);

/// One side of a range mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEnd {
    pub leaf: LeafId,
    pub strict: bool,
}

/// Accumulated bound on one index column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnMark {
    #[default]
    Unmarked,
    Equal(LeafId),
    Range {
        lower: Option<RangeEnd>,
        upper: Option<RangeEnd>,
    },
    InList(LeafId),
}

impl ColumnMark {
    pub fn is_marked(&self) -> bool {
        !matches!(self, ColumnMark::Unmarked)
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, ColumnMark::Equal(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnMark::Unmarked => "unmarked",
            ColumnMark::Equal(_) => "equal",
            ColumnMark::Range { .. } => "range",
            ColumnMark::InList(_) => "in-list",
        }
    }

    /// Leaves contributing to this mark
    pub fn leaves(&self) -> Vec<LeafId> {
        match self {
            ColumnMark::Unmarked => Vec::new(),
            ColumnMark::Equal(leaf) | ColumnMark::InList(leaf) => vec![*leaf],
            ColumnMark::Range { lower, upper } => {
                let mut leaves: Vec<LeafId> =
                    lower.iter().chain(upper.iter()).map(|e| e.leaf).collect();
                leaves.dedup();
                leaves
            }
        }
    }
}

/// A single mark a predicate leaf asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Equal,
    Lower { strict: bool },
    Upper { strict: bool },
    InList,
}

impl Mark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Equal => "equal",
            Mark::Lower { .. } => "lower",
            Mark::Upper { .. } => "upper",
            Mark::InList => "in-list",
        }
    }
}

/// How a candidate came out of the marking pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    Usable,
    /// No marks, or marks breaking the prefix rule
    Unusable,
    /// Dropped after a conflicting mark
    Excluded,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Usable => "USABLE",
            CandidateStatus::Unusable => "UNUSABLE",
            CandidateStatus::Excluded => "EXCLUDED",
        }
    }
}

/// One declared index evaluated against the current predicate tree
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateIndex {
    id: IndexId,
    name: String,
    kind: IndexKind,
    columns: Vec<String>,
    marks: Vec<ColumnMark>,
    excluded: Option<QueryError>,
}

impl CandidateIndex {
    pub fn new(id: IndexId, def: &IndexDef) -> Self {
        Self {
            id,
            name: def.name.clone(),
            kind: def.kind,
            columns: def.columns.clone(),
            marks: vec![ColumnMark::Unmarked; def.columns.len()],
            excluded: None,
        }
    }

    pub fn id(&self) -> IndexId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn marks(&self) -> &[ColumnMark] {
        &self.marks
    }

    /// Why the candidate was dropped, if it was
    pub fn exclusion(&self) -> Option<&QueryError> {
        self.excluded.as_ref()
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded.is_some()
    }

    /// Records `mark` at `position` for `leaf`.
    ///
    /// A second mark of the same kind keeps the first; the later leaf stays
    /// unconsumed and is evaluated as a filter. A mark of a different kind
    /// excludes the candidate and returns the conflict. Marks on an excluded
    /// candidate are ignored.
    pub fn mark(&mut self, position: usize, mark: Mark, leaf: LeafId) -> QueryResult<()> {
        if self.excluded.is_some() {
            return Ok(());
        }

        let Some(current) = self.marks.get(position).copied() else {
            let err = QueryError::InvalidDomain(format!(
                "index '{}' has no position {}",
                self.name, position
            ));
            self.excluded = Some(err.clone());
            return Err(err);
        };

        let end = |strict| Some(RangeEnd { leaf, strict });
        let next = match (current, mark) {
            (ColumnMark::Unmarked, Mark::Equal) => Some(ColumnMark::Equal(leaf)),
            (ColumnMark::Unmarked, Mark::InList) => Some(ColumnMark::InList(leaf)),
            (ColumnMark::Unmarked, Mark::Lower { strict }) => Some(ColumnMark::Range {
                lower: end(strict),
                upper: None,
            }),
            (ColumnMark::Unmarked, Mark::Upper { strict }) => Some(ColumnMark::Range {
                lower: None,
                upper: end(strict),
            }),
            (ColumnMark::Range { lower: None, upper }, Mark::Lower { strict }) => {
                Some(ColumnMark::Range {
                    lower: end(strict),
                    upper,
                })
            }
            (ColumnMark::Range { lower, upper: None }, Mark::Upper { strict }) => {
                Some(ColumnMark::Range {
                    lower,
                    upper: end(strict),
                })
            }
            (ColumnMark::Equal(_), Mark::Equal)
            | (ColumnMark::InList(_), Mark::InList)
            | (ColumnMark::Range { lower: Some(_), .. }, Mark::Lower { .. })
            | (ColumnMark::Range { upper: Some(_), .. }, Mark::Upper { .. }) => Some(current),
            _ => None,
        };

        match next {
            Some(next) => {
                self.marks[position] = next;
                Ok(())
            }
            None => {
                let err = QueryError::ConflictingBound {
                    index: self.name.clone(),
                    column: self.columns[position].clone(),
                    position,
                    existing: current.as_str(),
                    attempted: mark.as_str(),
                };
                self.excluded = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Marked positions form a run from 0, all equal except possibly the last
    pub fn satisfies_prefix(&self) -> bool {
        let mut gap = false;
        let mut closed = false;
        for mark in &self.marks {
            if !mark.is_marked() {
                gap = true;
                continue;
            }
            if gap || closed {
                return false;
            }
            if !mark.is_equal() {
                closed = true;
            }
        }
        true
    }

    pub fn is_usable(&self) -> bool {
        !self.is_excluded() && self.satisfies_prefix() && self.bound_column_count() > 0
    }

    pub fn status(&self) -> CandidateStatus {
        if self.is_excluded() {
            CandidateStatus::Excluded
        } else if self.is_usable() {
            CandidateStatus::Usable
        } else {
            CandidateStatus::Unusable
        }
    }

    /// Number of leading marked positions
    pub fn bound_column_count(&self) -> usize {
        self.marks.iter().take_while(|m| m.is_marked()).count()
    }

    /// Marks of the leading marked run
    pub fn bound_marks(&self) -> &[ColumnMark] {
        &self.marks[..self.bound_column_count()]
    }

    /// Last bound mark, if any
    pub fn tail_mark(&self) -> Option<&ColumnMark> {
        self.bound_marks().last()
    }

    /// True when the last bound position is a range or in-list rather than equal
    pub fn range_or_in_tail(&self) -> bool {
        matches!(
            self.tail_mark(),
            Some(ColumnMark::Range { .. }) | Some(ColumnMark::InList(_))
        )
    }

    /// Every column carries an equality mark
    pub fn is_fully_pinned(&self) -> bool {
        !self.marks.is_empty() && self.marks.iter().all(ColumnMark::is_equal)
    }

    /// Leaves whose marks fall inside the bound run
    pub fn consumed_leaves(&self) -> BTreeSet<LeafId> {
        self.bound_marks().iter().flat_map(ColumnMark::leaves).collect()
    }
}

/// Candidates for every index of a domain type, keyed by index id
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    candidates: BTreeMap<IndexId, CandidateIndex>,
}

impl CandidateSet {
    /// Fresh, unmarked candidates for every declared index
    pub fn for_domain<D: DomainTypeHandler + ?Sized>(domain: &D) -> Self {
        let candidates = domain
            .indexes()
            .iter()
            .enumerate()
            .map(|(i, def)| (IndexId(i), CandidateIndex::new(IndexId(i), def)))
            .collect();
        Self { candidates }
    }

    /// Applies one mark and hands the set back; conflicts exclude the index
    pub fn mark(mut self, at: IndexPosition, mark: Mark, leaf: LeafId) -> Self {
        if let Some(candidate) = self.candidates.get_mut(&at.index) {
            if let Err(err) = candidate.mark(at.position, mark, leaf) {
                let position = at.position.to_string();
                log_event_with_fields(
                    Event::IndexExcluded,
                    &[
                        ("code", err.code().code()),
                        ("index", candidate.name()),
                        ("position", position.as_str()),
                    ],
                );
            }
        }
        self
    }

    pub fn get(&self, id: IndexId) -> Option<&CandidateIndex> {
        self.candidates.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&CandidateIndex> {
        self.candidates.values().find(|c| c.name() == name)
    }

    /// Candidates in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &CandidateIndex> {
        self.candidates.values()
    }

    pub fn usable(&self) -> impl Iterator<Item = &CandidateIndex> {
        self.candidates.values().filter(|c| c.is_usable())
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(columns: &[&str]) -> CandidateIndex {
        CandidateIndex::new(
            IndexId(0),
            &IndexDef::new("idx", IndexKind::Ordered, columns.iter().copied()),
        )
    }

    #[test]
    fn test_fresh_candidate_unusable() {
        let c = index(&["a", "b"]);
        assert!(!c.is_usable());
        assert_eq!(c.bound_column_count(), 0);
        assert_eq!(c.status(), CandidateStatus::Unusable);
    }

    #[test]
    fn test_lower_and_upper_merge_into_range() {
        let mut c = index(&["a"]);
        c.mark(0, Mark::Lower { strict: true }, LeafId(0)).unwrap();
        c.mark(0, Mark::Upper { strict: false }, LeafId(1)).unwrap();

        assert_eq!(
            c.marks()[0],
            ColumnMark::Range {
                lower: Some(RangeEnd {
                    leaf: LeafId(0),
                    strict: true
                }),
                upper: Some(RangeEnd {
                    leaf: LeafId(1),
                    strict: false
                }),
            }
        );
        assert!(c.range_or_in_tail());
        assert_eq!(c.consumed_leaves().len(), 2);
    }

    #[test]
    fn test_equal_then_range_conflicts() {
        let mut c = index(&["a", "b"]);
        c.mark(0, Mark::Equal, LeafId(0)).unwrap();
        let err = c.mark(0, Mark::Lower { strict: true }, LeafId(1)).unwrap_err();

        match err {
            QueryError::ConflictingBound {
                existing,
                attempted,
                position,
                ..
            } => {
                assert_eq!(existing, "equal");
                assert_eq!(attempted, "lower");
                assert_eq!(position, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(c.is_excluded());
        assert!(!c.is_usable());
        assert_eq!(c.status(), CandidateStatus::Excluded);
    }

    #[test]
    fn test_same_kind_keeps_first_mark() {
        let mut c = index(&["a"]);
        c.mark(0, Mark::Lower { strict: false }, LeafId(0)).unwrap();
        c.mark(0, Mark::Lower { strict: true }, LeafId(1)).unwrap();
        c.mark(0, Mark::Upper { strict: true }, LeafId(2)).unwrap();
        c.mark(0, Mark::Upper { strict: false }, LeafId(3)).unwrap();

        assert!(!c.is_excluded());
        assert_eq!(
            c.marks()[0],
            ColumnMark::Range {
                lower: Some(RangeEnd {
                    leaf: LeafId(0),
                    strict: false
                }),
                upper: Some(RangeEnd {
                    leaf: LeafId(2),
                    strict: true
                }),
            }
        );
        assert_eq!(c.consumed_leaves(), BTreeSet::from([LeafId(0), LeafId(2)]));

        let mut c = index(&["a"]);
        c.mark(0, Mark::Equal, LeafId(0)).unwrap();
        c.mark(0, Mark::Equal, LeafId(1)).unwrap();
        assert_eq!(c.marks()[0], ColumnMark::Equal(LeafId(0)));
        assert!(c.is_usable());
    }

    #[test]
    fn test_in_list_then_range_conflicts() {
        let mut c = index(&["a"]);
        c.mark(0, Mark::InList, LeafId(0)).unwrap();
        let err = c.mark(0, Mark::Upper { strict: true }, LeafId(1)).unwrap_err();
        assert!(matches!(
            err,
            QueryError::ConflictingBound {
                existing: "in-list",
                attempted: "upper",
                ..
            }
        ));
    }

    #[test]
    fn test_marks_after_exclusion_ignored() {
        let mut c = index(&["a", "b"]);
        c.mark(0, Mark::Equal, LeafId(0)).unwrap();
        assert!(c.mark(0, Mark::InList, LeafId(1)).is_err());
        assert!(c.mark(1, Mark::Equal, LeafId(2)).is_ok());
        assert_eq!(c.marks()[1], ColumnMark::Unmarked);
    }

    #[test]
    fn test_gap_breaks_prefix() {
        let mut c = index(&["a", "b", "c"]);
        c.mark(0, Mark::Equal, LeafId(0)).unwrap();
        c.mark(2, Mark::Equal, LeafId(1)).unwrap();
        assert!(!c.satisfies_prefix());
        assert!(!c.is_usable());
    }

    #[test]
    fn test_missing_leading_column_breaks_prefix() {
        let mut c = index(&["a", "b"]);
        c.mark(1, Mark::Equal, LeafId(0)).unwrap();
        assert!(!c.is_usable());
        assert_eq!(c.bound_column_count(), 0);
    }

    #[test]
    fn test_in_list_must_be_tail() {
        let mut c = index(&["a", "b"]);
        c.mark(0, Mark::InList, LeafId(0)).unwrap();
        c.mark(1, Mark::Equal, LeafId(1)).unwrap();
        assert!(!c.is_usable());

        let mut c = index(&["a", "b"]);
        c.mark(0, Mark::Equal, LeafId(0)).unwrap();
        c.mark(1, Mark::InList, LeafId(1)).unwrap();
        assert!(c.is_usable());
        assert!(c.range_or_in_tail());
    }

    #[test]
    fn test_out_of_range_position_excludes() {
        let mut c = index(&["a"]);
        let err = c.mark(3, Mark::Equal, LeafId(0)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidDomain(_)));
        assert!(c.is_excluded());
    }

    #[test]
    fn test_fully_pinned() {
        let mut c = index(&["a", "b"]);
        c.mark(0, Mark::Equal, LeafId(0)).unwrap();
        assert!(!c.is_fully_pinned());
        c.mark(1, Mark::Equal, LeafId(1)).unwrap();
        assert!(c.is_fully_pinned());
        assert!(!c.range_or_in_tail());
    }
}
