//! Field and domain-type handlers
//!
//! The query core consults these read-only lookups; it never builds them.
//! `ColumnHandler` is the default field handler: it checks each value
//! against the column type and forwards it unchanged to the scan.

use serde_json::Value;

use crate::query::{QueryError, QueryResult};
use crate::store::{BinaryCondition, BoundType, ScanFilter, ScanOperation};

use super::types::{value_kind, ColumnType, FieldId, IndexDef, IndexPosition};

/// Resolves one field to its indexes and translates values into scan calls
pub trait DomainFieldHandler {
    /// Column name
    fn name(&self) -> &str;

    /// Every (index, position) pair this field participates in
    fn index_positions(&self) -> &[IndexPosition];

    fn set_equal_bound(
        &self,
        value: &Value,
        position: usize,
        op: &mut dyn ScanOperation,
    ) -> QueryResult<()>;

    fn set_range_bound(
        &self,
        value: &Value,
        bound: BoundType,
        position: usize,
        op: &mut dyn ScanOperation,
    ) -> QueryResult<()>;

    fn set_in_list_bound(
        &self,
        values: &[Value],
        position: usize,
        op: &mut dyn ScanOperation,
    ) -> QueryResult<()>;

    fn compare_in_filter(
        &self,
        value: &Value,
        condition: BinaryCondition,
        filter: &mut dyn ScanFilter,
    ) -> QueryResult<()>;
}

/// Read-only metadata of a mapped table
pub trait DomainTypeHandler {
    /// Table name
    fn name(&self) -> &str;

    /// Declared indexes; `IndexId(n)` is `indexes()[n]`
    fn indexes(&self) -> &[IndexDef];

    fn field_id(&self, name: &str) -> Option<FieldId>;

    fn field_handler(&self, field: FieldId) -> Option<&dyn DomainFieldHandler>;
}

/// Default field handler for a typed column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHandler {
    name: String,
    column_type: ColumnType,
    positions: Vec<IndexPosition>,
}

impl ColumnHandler {
    pub fn new(
        name: impl Into<String>,
        column_type: ColumnType,
        positions: Vec<IndexPosition>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type,
            positions,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn check(&self, value: &Value) -> QueryResult<()> {
        if self.column_type.accepts(value) {
            Ok(())
        } else {
            Err(QueryError::TypeMismatch {
                column: self.name.clone(),
                expected: self.column_type.type_name(),
                found: value_kind(value),
            })
        }
    }
}

impl DomainFieldHandler for ColumnHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn index_positions(&self) -> &[IndexPosition] {
        &self.positions
    }

    fn set_equal_bound(
        &self,
        value: &Value,
        position: usize,
        op: &mut dyn ScanOperation,
    ) -> QueryResult<()> {
        self.check(value)?;
        op.set_bound(position, &self.name, BoundType::Eq, value)?;
        Ok(())
    }

    fn set_range_bound(
        &self,
        value: &Value,
        bound: BoundType,
        position: usize,
        op: &mut dyn ScanOperation,
    ) -> QueryResult<()> {
        self.check(value)?;
        op.set_bound(position, &self.name, bound, value)?;
        Ok(())
    }

    fn set_in_list_bound(
        &self,
        values: &[Value],
        position: usize,
        op: &mut dyn ScanOperation,
    ) -> QueryResult<()> {
        for value in values {
            self.check(value)?;
        }
        op.set_in_list(position, &self.name, values)?;
        Ok(())
    }

    fn compare_in_filter(
        &self,
        value: &Value,
        condition: BinaryCondition,
        filter: &mut dyn ScanFilter,
    ) -> QueryResult<()> {
        self.check(value)?;
        filter.cmp(condition, &self.name, value)?;
        Ok(())
    }
}
