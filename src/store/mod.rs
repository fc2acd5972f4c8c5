//! Storage engine contract consumed by the query core
//!
//! The core never executes scans itself. It opens a scan operation for the
//! access path chosen by the index selector, pushes bound-setting calls keyed
//! by index column position, pushes filter conditions keyed by comparison
//! kind, and finally asks the operation to run.
//!
//! `MemoryStore` is an in-memory implementation of the contract used by the
//! tests and the CLI.

mod compare;
mod errors;
mod memory;
mod result;

pub use compare::{compare_values, condition_holds};
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use result::{AppliedBound, BoundValue, ScanResult};

use serde_json::Value;

/// Bound applied to one index column, read as `column <op> value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundType {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

impl BoundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundType::Eq => "eq",
            BoundType::Ge => "ge",
            BoundType::Gt => "gt",
            BoundType::Le => "le",
            BoundType::Lt => "lt",
        }
    }

    /// Lower bound type for the given strictness
    pub fn lower(strict: bool) -> Self {
        if strict {
            BoundType::Gt
        } else {
            BoundType::Ge
        }
    }

    /// Upper bound type for the given strictness
    pub fn upper(strict: bool) -> Self {
        if strict {
            BoundType::Lt
        } else {
            BoundType::Le
        }
    }
}

/// Row-by-row comparison pushed into a scan filter, read as `column <op> value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryCondition {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

impl BinaryCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryCondition::Eq => "eq",
            BinaryCondition::Ge => "ge",
            BinaryCondition::Gt => "gt",
            BinaryCondition::Le => "le",
            BinaryCondition::Lt => "lt",
        }
    }
}

/// Boolean grouping of filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGroup {
    And,
    Or,
}

/// Access path a scan operation is opened for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// Single-row lookup through a unique index, every column bound by equality
    UniqueLookup { index: String },
    /// Range or multi-range scan through an ordered index
    IndexScan { index: String },
    /// Full table scan, filter only
    TableScan,
}

impl ScanTarget {
    /// Name of the index scanned, if any
    pub fn index(&self) -> Option<&str> {
        match self {
            ScanTarget::UniqueLookup { index } | ScanTarget::IndexScan { index } => Some(index),
            ScanTarget::TableScan => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanTarget::UniqueLookup { .. } => "UNIQUE_LOOKUP",
            ScanTarget::IndexScan { .. } => "INDEX_SCAN",
            ScanTarget::TableScan => "TABLE_SCAN",
        }
    }
}

/// Record store able to open scans against its tables
pub trait Store {
    /// Opens a scan operation on `table` for the given access path
    fn open_scan<'s>(
        &'s self,
        table: &str,
        target: &ScanTarget,
    ) -> StoreResult<Box<dyn ScanOperation + 's>>;
}

/// A scan being prepared; bounds and filters are pushed before `execute`
pub trait ScanOperation {
    /// Bounds the index column at `position` (named `column`)
    fn set_bound(
        &mut self,
        position: usize,
        column: &str,
        bound: BoundType,
        value: &Value,
    ) -> StoreResult<()>;

    /// Bounds the index column at `position` to any of `values` (multi-range scan)
    fn set_in_list(&mut self, position: usize, column: &str, values: &[Value]) -> StoreResult<()>;

    /// Filter evaluated against every row the bounds let through
    fn filter(&mut self) -> &mut dyn ScanFilter;

    /// Runs the scan
    fn execute(self: Box<Self>) -> StoreResult<ScanResult>;
}

/// Row filter built from nested AND/OR groups of column comparisons
pub trait ScanFilter {
    fn begin(&mut self, group: FilterGroup) -> StoreResult<()>;

    fn cmp(&mut self, condition: BinaryCondition, column: &str, value: &Value) -> StoreResult<()>;

    fn end(&mut self) -> StoreResult<()>;
}
