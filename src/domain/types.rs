//! Domain type definitions
//!
//! Supported column types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - bool: Boolean
//! - float: 64-bit floating point

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position of a field in its domain type's column list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub usize);

/// Position of an index in its domain type's index list (declaration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexId(pub usize);

/// Where a field sits inside one index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPosition {
    pub index: IndexId,
    pub position: usize,
}

/// Column value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Bool,
    Float,
}

impl ColumnType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Bool => "bool",
            ColumnType::Float => "float",
        }
    }

    /// Returns true if `value` can be stored in a column of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ColumnType::String => value.is_string(),
            ColumnType::Int => value.is_i64() || value.is_u64(),
            ColumnType::Bool => value.is_boolean(),
            ColumnType::Float => value.is_number(),
        }
    }
}

/// Describes a JSON value's kind for error messages
pub(crate) fn value_kind(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(n) if n.is_f64() => "float".into(),
        Value::Number(_) => "int".into(),
        Value::String(_) => "string".into(),
        Value::Array(_) => "array".into(),
        Value::Object(_) => "object".into(),
    }
}

/// Index kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Hash-style unique index, usable only when every column is pinned
    Unique,
    /// Ordered index, usable for prefix equality, ranges and in-lists
    Ordered,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Unique => "unique",
            IndexKind::Ordered => "ordered",
        }
    }
}

/// A declared index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDef {
    pub name: String,
    pub kind: IndexKind,
    /// Column names in index order
    pub columns: Vec<String>,
}

impl IndexDef {
    pub fn new(
        name: impl Into<String>,
        kind: IndexKind,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// A declared column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Serializable definition of a mapped table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainTypeDef {
    /// Table name
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Primary key columns; becomes the unique index `PRIMARY`
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Secondary indexes
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

impl DomainTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            column_type,
        });
        self
    }

    pub fn with_primary_key(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_index(
        mut self,
        name: impl Into<String>,
        kind: IndexKind,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.indexes.push(IndexDef::new(name, kind, columns));
        self
    }
}
