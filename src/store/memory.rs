//! In-memory record store
//!
//! Rows are JSON objects kept in insertion order. Index scans narrow rows by
//! the bounds pushed into the operation and return them in index order;
//! table scans read every row. The filter tree is evaluated against every
//! row the bounds let through.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{DomainTypeHandler, IndexDef, IndexKind};

use super::compare::{bound_holds, compare_values, condition_holds};
use super::errors::{StoreError, StoreResult};
use super::result::{AppliedBound, BoundValue, ScanResult};
use super::{BinaryCondition, BoundType, FilterGroup, ScanFilter, ScanOperation, ScanTarget, Store};

#[derive(Debug)]
struct MemoryTable {
    indexes: Vec<IndexDef>,
    rows: Vec<Value>,
}

impl MemoryTable {
    fn index(&self, table: &str, name: &str) -> StoreResult<&IndexDef> {
        self.indexes
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| StoreError::UnknownIndex {
                table: table.to_string(),
                index: name.to_string(),
            })
    }

    /// Finds a row holding the same unique key as `row`
    fn violates_unique(&self, row: &Value) -> Option<&IndexDef> {
        self.indexes
            .iter()
            .filter(|i| i.kind == IndexKind::Unique)
            .find(|index| {
                self.rows.iter().any(|existing| {
                    index.columns.iter().all(|c| match (existing.get(c), row.get(c)) {
                        (Some(a), Some(b)) => compare_values(a, b) == Some(Ordering::Equal),
                        _ => false,
                    })
                })
            })
    }
}

/// In-memory implementation of the storage contract
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, MemoryTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table carrying the domain type's indexes
    pub fn create_table<D: DomainTypeHandler + ?Sized>(&mut self, domain: &D) {
        self.tables.insert(
            domain.name().to_string(),
            MemoryTable {
                indexes: domain.indexes().to_vec(),
                rows: Vec::new(),
            },
        );
    }

    /// Inserts a row, enforcing unique indexes
    pub fn insert(&mut self, table: &str, row: Value) -> StoreResult<()> {
        let t = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        if !row.is_object() {
            return Err(StoreError::InvalidRow("row must be a JSON object".into()));
        }
        if let Some(index) = t.violates_unique(&row) {
            return Err(StoreError::InvalidRow(format!(
                "duplicate key for unique index '{}'",
                index.name
            )));
        }

        t.rows.push(row);
        Ok(())
    }

    /// Returns the number of rows in a table (0 for unknown tables)
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }
}

impl Store for MemoryStore {
    fn open_scan<'s>(
        &'s self,
        table: &str,
        target: &ScanTarget,
    ) -> StoreResult<Box<dyn ScanOperation + 's>> {
        let t = self
            .tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        let index = match target.index() {
            Some(name) => Some(t.index(table, name)?),
            None => None,
        };

        if let (ScanTarget::UniqueLookup { index: name }, Some(def)) = (target, index) {
            if def.kind != IndexKind::Unique {
                return Err(StoreError::InvalidBound(format!(
                    "index '{}' is not unique",
                    name
                )));
            }
        }

        Ok(Box::new(MemoryScan {
            table: t,
            target: target.clone(),
            index,
            bounds: Vec::new(),
            filter: MemoryFilter::default(),
        }))
    }
}

struct MemoryScan<'s> {
    table: &'s MemoryTable,
    target: ScanTarget,
    index: Option<&'s IndexDef>,
    bounds: Vec<AppliedBound>,
    filter: MemoryFilter,
}

impl MemoryScan<'_> {
    fn check_column(&self, position: usize, column: &str) -> StoreResult<()> {
        let index = self
            .index
            .ok_or_else(|| StoreError::InvalidBound("table scans take no bounds".into()))?;

        match index.columns.get(position) {
            Some(c) if c == column => Ok(()),
            Some(c) => Err(StoreError::InvalidBound(format!(
                "position {} of index '{}' is '{}', not '{}'",
                position, index.name, c, column
            ))),
            None => Err(StoreError::InvalidBound(format!(
                "index '{}' has no position {}",
                index.name, position
            ))),
        }
    }

    fn is_unique_lookup(&self) -> bool {
        matches!(self.target, ScanTarget::UniqueLookup { .. })
    }

    fn admits(&self, row: &Value) -> bool {
        self.bounds.iter().all(|b| {
            let Some(actual) = row.get(&b.column) else {
                return false;
            };
            match &b.value {
                BoundValue::Single(bound, value) => bound_holds(*bound, actual, value),
                BoundValue::InList(values) => values
                    .iter()
                    .any(|v| bound_holds(BoundType::Eq, actual, v)),
            }
        })
    }

    fn index_order(&self, a: &Value, b: &Value) -> Ordering {
        let Some(index) = self.index else {
            return Ordering::Equal;
        };
        for column in &index.columns {
            let ordering = match (a.get(column), b.get(column)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl ScanOperation for MemoryScan<'_> {
    fn set_bound(
        &mut self,
        position: usize,
        column: &str,
        bound: BoundType,
        value: &Value,
    ) -> StoreResult<()> {
        self.check_column(position, column)?;
        if self.is_unique_lookup() && bound != BoundType::Eq {
            return Err(StoreError::InvalidBound(format!(
                "unique lookups take equality bounds only, got '{}' on '{}'",
                bound.as_str(),
                column
            )));
        }
        self.bounds.push(AppliedBound {
            position,
            column: column.to_string(),
            value: BoundValue::Single(bound, value.clone()),
        });
        Ok(())
    }

    fn set_in_list(&mut self, position: usize, column: &str, values: &[Value]) -> StoreResult<()> {
        self.check_column(position, column)?;
        if self.is_unique_lookup() {
            return Err(StoreError::InvalidBound(format!(
                "unique lookups take no multi-value bound (column '{}')",
                column
            )));
        }
        self.bounds.push(AppliedBound {
            position,
            column: column.to_string(),
            value: BoundValue::InList(values.to_vec()),
        });
        Ok(())
    }

    fn filter(&mut self) -> &mut dyn ScanFilter {
        &mut self.filter
    }

    fn execute(self: Box<Self>) -> StoreResult<ScanResult> {
        let scan = *self;
        let table = scan.table;

        if let (true, Some(index)) = (scan.is_unique_lookup(), scan.index) {
            let pinned = (0..index.columns.len())
                .all(|p| scan.bounds.iter().any(|b| b.position == p && b.is_equal()));
            if !pinned {
                return Err(StoreError::InvalidBound(format!(
                    "unique lookup on '{}' needs every column bound",
                    index.name
                )));
            }
        }

        let mut rows: Vec<&Value> = table.rows.iter().filter(|r| scan.admits(r)).collect();
        if matches!(scan.target, ScanTarget::IndexScan { .. }) {
            rows.sort_by(|a, b| scan.index_order(a, b));
        }
        let scanned_count = rows.len();

        let conditions = scan.filter.conditions;
        let filter = scan.filter.finish()?;
        let records = rows
            .into_iter()
            .filter(|r| filter.iter().all(|node| node.eval(r)))
            .cloned()
            .collect();

        Ok(ScanResult {
            records,
            target: scan.target,
            bounds: scan.bounds,
            filter_conditions: conditions,
            scanned_count,
        })
    }
}

#[derive(Debug)]
enum FilterNode {
    Group(FilterGroup, Vec<FilterNode>),
    Cmp(BinaryCondition, String, Value),
}

impl FilterNode {
    fn eval(&self, row: &Value) -> bool {
        match self {
            FilterNode::Group(FilterGroup::And, children) => children.iter().all(|c| c.eval(row)),
            FilterNode::Group(FilterGroup::Or, children) => children.iter().any(|c| c.eval(row)),
            FilterNode::Cmp(condition, column, value) => row
                .get(column)
                .map(|actual| condition_holds(*condition, actual, value))
                .unwrap_or(false),
        }
    }
}

/// Filter under construction; top-level nodes are implicitly AND-ed
#[derive(Debug, Default)]
struct MemoryFilter {
    open: Vec<(FilterGroup, Vec<FilterNode>)>,
    root: Vec<FilterNode>,
    conditions: usize,
}

impl MemoryFilter {
    fn push(&mut self, node: FilterNode) {
        match self.open.last_mut() {
            Some((_, children)) => children.push(node),
            None => self.root.push(node),
        }
    }

    fn finish(self) -> StoreResult<Vec<FilterNode>> {
        if !self.open.is_empty() {
            return Err(StoreError::InvalidFilter(format!(
                "{} filter group(s) left open",
                self.open.len()
            )));
        }
        Ok(self.root)
    }
}

impl ScanFilter for MemoryFilter {
    fn begin(&mut self, group: FilterGroup) -> StoreResult<()> {
        self.open.push((group, Vec::new()));
        Ok(())
    }

    fn cmp(&mut self, condition: BinaryCondition, column: &str, value: &Value) -> StoreResult<()> {
        self.conditions += 1;
        self.push(FilterNode::Cmp(condition, column.to_string(), value.clone()));
        Ok(())
    }

    fn end(&mut self) -> StoreResult<()> {
        let (group, children) = self
            .open
            .pop()
            .ok_or_else(|| StoreError::InvalidFilter("end() without begin()".into()))?;
        self.push(FilterNode::Group(group, children));
        Ok(())
    }
}
