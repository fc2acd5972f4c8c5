//! Validated domain type built from a `DomainTypeDef`

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::observability::{log_event_with_fields, Event};
use crate::query::{QueryError, QueryResult};

use super::handler::{ColumnHandler, DomainFieldHandler, DomainTypeHandler};
use super::types::{DomainTypeDef, FieldId, IndexDef, IndexId, IndexKind, IndexPosition};

/// Name given to the index built from the primary key
pub const PRIMARY_INDEX: &str = "PRIMARY";

/// A mapped table with its column handlers and declared indexes
#[derive(Debug, Clone)]
pub struct DomainType {
    name: String,
    columns: Vec<ColumnHandler>,
    indexes: Vec<IndexDef>,
}

impl DomainType {
    /// Loads and validates a JSON domain definition
    pub fn load(path: &Path) -> QueryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            QueryError::InvalidDomain(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let def: DomainTypeDef = serde_json::from_str(&content)
            .map_err(|e| QueryError::InvalidDomain(format!("Invalid domain JSON: {}", e)))?;
        let domain = Self::try_from(def)?;

        let indexes = domain.indexes.len().to_string();
        log_event_with_fields(
            Event::DomainLoaded,
            &[("domain", domain.name.as_str()), ("indexes", indexes.as_str())],
        );
        Ok(domain)
    }

    /// Column handlers in declaration order
    pub fn columns(&self) -> &[ColumnHandler] {
        &self.columns
    }

    /// Looks up an index by name
    pub fn index_id(&self, name: &str) -> Option<IndexId> {
        self.indexes.iter().position(|i| i.name == name).map(IndexId)
    }
}

impl TryFrom<DomainTypeDef> for DomainType {
    type Error = QueryError;

    fn try_from(def: DomainTypeDef) -> QueryResult<Self> {
        if def.name.is_empty() {
            return Err(QueryError::InvalidDomain("table name is empty".into()));
        }

        let mut seen = HashSet::new();
        for column in &def.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(QueryError::InvalidDomain(format!(
                    "column '{}' declared twice",
                    column.name
                )));
            }
        }

        let mut indexes = Vec::with_capacity(def.indexes.len() + 1);
        if !def.primary_key.is_empty() {
            indexes.push(IndexDef::new(
                PRIMARY_INDEX,
                IndexKind::Unique,
                def.primary_key.iter().cloned(),
            ));
        }
        indexes.extend(def.indexes.iter().cloned());

        let mut names = HashSet::new();
        for index in &indexes {
            if !names.insert(index.name.as_str()) {
                return Err(QueryError::InvalidDomain(format!(
                    "index '{}' declared twice",
                    index.name
                )));
            }
            if index.columns.is_empty() {
                return Err(QueryError::InvalidDomain(format!(
                    "index '{}' has no columns",
                    index.name
                )));
            }
            let mut in_index = HashSet::new();
            for column in &index.columns {
                if !seen.contains(column.as_str()) {
                    return Err(QueryError::InvalidDomain(format!(
                        "index '{}' names unknown column '{}'",
                        index.name, column
                    )));
                }
                if !in_index.insert(column.as_str()) {
                    return Err(QueryError::InvalidDomain(format!(
                        "index '{}' lists column '{}' twice",
                        index.name, column
                    )));
                }
            }
        }

        let columns = def
            .columns
            .iter()
            .map(|column| {
                let positions = indexes
                    .iter()
                    .enumerate()
                    .flat_map(|(i, index)| {
                        index
                            .columns
                            .iter()
                            .position(|c| *c == column.name)
                            .map(|position| IndexPosition {
                                index: IndexId(i),
                                position,
                            })
                    })
                    .collect();
                ColumnHandler::new(column.name.clone(), column.column_type, positions)
            })
            .collect();

        Ok(Self {
            name: def.name,
            columns,
            indexes,
        })
    }
}

impl DomainTypeHandler for DomainType {
    fn name(&self) -> &str {
        &self.name
    }

    fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    fn field_id(&self, name: &str) -> Option<FieldId> {
        self.columns
            .iter()
            .position(|c| DomainFieldHandler::name(c) == name)
            .map(FieldId)
    }

    fn field_handler(&self, field: FieldId) -> Option<&dyn DomainFieldHandler> {
        self.columns
            .get(field.0)
            .map(|c| c as &dyn DomainFieldHandler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ColumnType;
    use std::io::Write;

    fn orders_def() -> DomainTypeDef {
        DomainTypeDef::new("orders")
            .with_column("id", ColumnType::Int)
            .with_column("customer", ColumnType::String)
            .with_column("placed", ColumnType::Int)
            .with_primary_key(["id"])
            .with_index("by_customer", IndexKind::Ordered, ["customer", "placed"])
    }

    #[test]
    fn test_primary_key_declared_first() {
        let domain = DomainType::try_from(orders_def()).unwrap();
        assert_eq!(domain.indexes()[0].name, PRIMARY_INDEX);
        assert_eq!(domain.indexes()[0].kind, IndexKind::Unique);
        assert_eq!(domain.index_id("by_customer"), Some(IndexId(1)));
    }

    #[test]
    fn test_index_positions_resolved() {
        let domain = DomainType::try_from(orders_def()).unwrap();
        let placed = domain.field_id("placed").unwrap();
        let handler = domain.field_handler(placed).unwrap();

        assert_eq!(
            handler.index_positions(),
            &[IndexPosition {
                index: IndexId(1),
                position: 1
            }]
        );
        assert!(domain.field_id("missing").is_none());
    }

    #[test]
    fn test_unknown_index_column_rejected() {
        let def = orders_def().with_index("bad", IndexKind::Ordered, ["nope"]);
        let err = DomainType::try_from(def).unwrap_err();
        assert_eq!(err.code().code(), "QUERY_INVALID_DOMAIN");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let def = orders_def().with_column("id", ColumnType::Int);
        assert!(DomainType::try_from(def).is_err());

        let def = orders_def().with_index("by_customer", IndexKind::Ordered, ["id"]);
        assert!(DomainType::try_from(def).is_err());

        let def = orders_def().with_index("twice", IndexKind::Ordered, ["id", "id"]);
        assert!(DomainType::try_from(def).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            serde_json::to_string(&orders_def()).unwrap()
        )
        .unwrap();

        let domain = DomainType::load(file.path()).unwrap();
        assert_eq!(domain.name(), "orders");
        assert_eq!(domain.indexes().len(), 2);
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = DomainType::load(file.path()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidDomain(_)));
    }
}
