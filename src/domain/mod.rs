//! Domain type metadata
//!
//! A domain type is a mapped table: typed columns, an optional primary key
//! and secondary indexes. The query core only reads it, through the
//! `DomainTypeHandler` and `DomainFieldHandler` traits.

mod domain_type;
mod handler;
mod types;

pub use domain_type::{DomainType, PRIMARY_INDEX};
pub use handler::{ColumnHandler, DomainFieldHandler, DomainTypeHandler};
pub use types::{
    ColumnDef, ColumnType, DomainTypeDef, FieldId, IndexDef, IndexId, IndexKind, IndexPosition,
};
