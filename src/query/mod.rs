//! Query predicate building and index selection
//!
//! Flow for one execution:
//! 1. The facade builds properties and parameters, comparisons build a
//!    predicate tree.
//! 2. Parameters are bound; unbound ones fail before any storage call.
//! 3. The tree marks bounds on a fresh candidate per declared index.
//! 4. The selector picks the access path and replays the tree: consumed
//!    leaves set scan bounds, the rest become row filters.

mod candidate;
mod errors;
mod explain;
mod facade;
mod operand;
mod params;
mod predicate;
mod selector;

pub use candidate::{
    CandidateIndex, CandidateSet, CandidateStatus, ColumnMark, LeafId, Mark, RangeEnd,
};
pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use explain::{CandidateReport, ExplainPlan};
pub use facade::{Query, QueryDomainType, QueryPlan};
pub use operand::{Operand, Parameter, Property};
pub use params::ParameterBindings;
pub use predicate::{Leaf, Predicate};
pub use selector::{IndexSelector, ScanPlan};
