//! Predicate trees
//!
//! One tagged union covers every comparison kind plus conjunction. Trees are
//! built bottom-up from property comparisons and never change afterwards;
//! parameter values live in `ParameterBindings`, not in the tree.
//!
//! Leaves are numbered depth-first, left to right (`LeafId`). Both the
//! marking pass and the emission pass walk in that order, so a mark can
//! always be traced back to the leaf that produced it.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{DomainFieldHandler, DomainTypeHandler};
use crate::store::{BinaryCondition, FilterGroup, ScanFilter};

use super::candidate::{CandidateSet, LeafId, Mark};
use super::errors::{QueryError, QueryResult};
use super::operand::{Parameter, Property};
use super::params::ParameterBindings;

/// A property compared against one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub property: Property,
    pub param: Parameter,
}

/// Predicate tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Equal(Leaf),
    /// Inclusive on both ends
    Between {
        property: Property,
        lower: Parameter,
        upper: Parameter,
    },
    GreaterThan(Leaf),
    GreaterEqual(Leaf),
    LessThan(Leaf),
    LessEqual(Leaf),
    In(Leaf),
    And(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Conjunction of `self` and `other`
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            Predicate::Equal(_) => "equal",
            Predicate::Between { .. } => "between",
            Predicate::GreaterThan(_) => "greaterThan",
            Predicate::GreaterEqual(_) => "greaterEqual",
            Predicate::LessThan(_) => "lessThan",
            Predicate::LessEqual(_) => "lessEqual",
            Predicate::In(_) => "in",
            Predicate::And(..) => "and",
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Predicate::And(..))
    }

    /// Compared property of a leaf
    pub fn property(&self) -> Option<&Property> {
        match self {
            Predicate::Equal(l)
            | Predicate::GreaterThan(l)
            | Predicate::GreaterEqual(l)
            | Predicate::LessThan(l)
            | Predicate::LessEqual(l)
            | Predicate::In(l) => Some(&l.property),
            Predicate::Between { property, .. } => Some(property),
            Predicate::And(..) => None,
        }
    }

    /// Parameters referenced anywhere in the tree, left to right
    pub fn parameters(&self) -> Vec<&Parameter> {
        match self {
            Predicate::Equal(l)
            | Predicate::GreaterThan(l)
            | Predicate::GreaterEqual(l)
            | Predicate::LessThan(l)
            | Predicate::LessEqual(l)
            | Predicate::In(l) => vec![&l.param],
            Predicate::Between { lower, upper, .. } => vec![lower, upper],
            Predicate::And(left, right) => {
                let mut params = left.parameters();
                params.extend(right.parameters());
                params
            }
        }
    }

    /// Domain types referenced by the tree's properties
    pub fn domains(&self) -> BTreeSet<&str> {
        let mut domains = BTreeSet::new();
        self.for_each_leaf(&mut |_, leaf| {
            if let Some(p) = leaf.property() {
                domains.insert(p.domain());
            }
        });
        domains
    }

    /// Visits every leaf with its id
    pub fn for_each_leaf<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(LeafId, &'a Predicate),
    {
        let mut next = 0;
        self.walk(&mut next, f);
    }

    fn walk<'a, F>(&'a self, next: &mut usize, f: &mut F)
    where
        F: FnMut(LeafId, &'a Predicate),
    {
        match self {
            Predicate::And(left, right) => {
                left.walk(next, f);
                right.walk(next, f);
            }
            leaf => {
                f(LeafId(*next), leaf);
                *next += 1;
            }
        }
    }

    /// Leaves in id order
    pub fn leaves(&self) -> Vec<&Predicate> {
        let mut leaves = Vec::new();
        self.for_each_leaf(&mut |_, leaf| leaves.push(leaf));
        leaves
    }

    /// Marks this leaf asks for on every index position of its field
    fn leaf_marks(&self) -> &'static [Mark] {
        match self {
            Predicate::Equal(_) => &[Mark::Equal],
            Predicate::GreaterThan(_) => &[Mark::Lower { strict: true }],
            Predicate::GreaterEqual(_) => &[Mark::Lower { strict: false }],
            Predicate::LessThan(_) => &[Mark::Upper { strict: true }],
            Predicate::LessEqual(_) => &[Mark::Upper { strict: false }],
            Predicate::Between { .. } => &[
                Mark::Lower { strict: false },
                Mark::Upper { strict: false },
            ],
            Predicate::In(_) => &[Mark::InList],
            Predicate::And(..) => &[],
        }
    }

    /// Marks bounds on every candidate the tree's fields participate in.
    ///
    /// Pure in the tree and the index definitions: fresh candidate sets
    /// always come back marked the same way.
    pub fn mark_bounds<D>(&self, domain: &D, candidates: CandidateSet) -> CandidateSet
    where
        D: DomainTypeHandler + ?Sized,
    {
        let mut next = 0;
        self.mark_from(domain, &mut next, candidates)
    }

    fn mark_from<D>(&self, domain: &D, next: &mut usize, candidates: CandidateSet) -> CandidateSet
    where
        D: DomainTypeHandler + ?Sized,
    {
        match self {
            Predicate::And(left, right) => {
                let candidates = left.mark_from(domain, next, candidates);
                right.mark_from(domain, next, candidates)
            }
            leaf => {
                let id = LeafId(*next);
                *next += 1;

                let Some(handler) = leaf
                    .property()
                    .and_then(|p| domain.field_handler(p.field()))
                else {
                    return candidates;
                };

                handler
                    .index_positions()
                    .iter()
                    .fold(candidates, |candidates, at| {
                        leaf.leaf_marks()
                            .iter()
                            .fold(candidates, |candidates, mark| candidates.mark(*at, *mark, id))
                    })
            }
        }
    }

    /// Parameter feeding an equality or in-list mark
    pub(crate) fn point_parameter(&self) -> Option<&Parameter> {
        match self {
            Predicate::Equal(l) | Predicate::In(l) => Some(&l.param),
            _ => None,
        }
    }

    /// Parameter feeding a lower-bound mark
    pub(crate) fn lower_parameter(&self) -> Option<&Parameter> {
        match self {
            Predicate::GreaterThan(l) | Predicate::GreaterEqual(l) => Some(&l.param),
            Predicate::Between { lower, .. } => Some(lower),
            _ => None,
        }
    }

    /// Parameter feeding an upper-bound mark
    pub(crate) fn upper_parameter(&self) -> Option<&Parameter> {
        match self {
            Predicate::LessThan(l) | Predicate::LessEqual(l) => Some(&l.param),
            Predicate::Between { upper, .. } => Some(upper),
            _ => None,
        }
    }

    /// Pushes this predicate into `filter` as row-by-row conditions
    pub fn emit_filter<D>(
        &self,
        domain: &D,
        bindings: &ParameterBindings,
        filter: &mut dyn ScanFilter,
    ) -> QueryResult<()>
    where
        D: DomainTypeHandler + ?Sized,
    {
        if let Predicate::And(left, right) = self {
            left.emit_filter(domain, bindings, filter)?;
            return right.emit_filter(domain, bindings, filter);
        }

        let handler = field_handler(domain, self)?;
        let cmp = |condition: BinaryCondition, param: &Parameter, filter: &mut dyn ScanFilter| {
            handler.compare_in_filter(bindings.require(param.name())?, condition, filter)
        };

        match self {
            Predicate::Equal(l) => cmp(BinaryCondition::Eq, &l.param, filter),
            Predicate::GreaterThan(l) => cmp(BinaryCondition::Gt, &l.param, filter),
            Predicate::GreaterEqual(l) => cmp(BinaryCondition::Ge, &l.param, filter),
            Predicate::LessThan(l) => cmp(BinaryCondition::Lt, &l.param, filter),
            Predicate::LessEqual(l) => cmp(BinaryCondition::Le, &l.param, filter),
            Predicate::Between { lower, upper, .. } => {
                cmp(BinaryCondition::Ge, lower, filter)?;
                cmp(BinaryCondition::Le, upper, filter)
            }
            Predicate::In(l) => {
                filter.begin(FilterGroup::Or)?;
                for value in bindings.require_list(l.param.name())? {
                    handler.compare_in_filter(value, BinaryCondition::Eq, filter)?;
                }
                filter.end()?;
                Ok(())
            }
            Predicate::And(..) => Ok(()),
        }
    }
}

/// Field handler of a leaf's property
pub(crate) fn field_handler<'d, D>(
    domain: &'d D,
    leaf: &Predicate,
) -> QueryResult<&'d dyn DomainFieldHandler>
where
    D: DomainTypeHandler + ?Sized,
{
    let property = leaf
        .property()
        .ok_or_else(|| QueryError::Usage("conjunctions have no property".into()))?;
    domain
        .field_handler(property.field())
        .ok_or_else(|| QueryError::unknown_field(domain.name(), property.name()))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equal(l) => write!(f, "{} = {}", l.property.name(), l.param),
            Predicate::GreaterThan(l) => write!(f, "{} > {}", l.property.name(), l.param),
            Predicate::GreaterEqual(l) => write!(f, "{} >= {}", l.property.name(), l.param),
            Predicate::LessThan(l) => write!(f, "{} < {}", l.property.name(), l.param),
            Predicate::LessEqual(l) => write!(f, "{} <= {}", l.property.name(), l.param),
            Predicate::In(l) => write!(f, "{} IN {}", l.property.name(), l.param),
            Predicate::Between {
                property,
                lower,
                upper,
            } => write!(f, "{} BETWEEN {} AND {}", property.name(), lower, upper),
            Predicate::And(left, right) => write!(f, "({} AND {})", left, right),
        }
    }
}
