//! keyscan - client-side query predicate builder and index-candidate selector
//!
//! Queries are built against a typed domain type from property/parameter
//! comparisons. For every declared index the predicate tree marks which
//! leading columns it can bound; the selector picks the best usable index
//! (or a table scan) and drives a storage scan with bounds and row filters.

pub mod cli;
pub mod config;
pub mod domain;
pub mod observability;
pub mod query;
pub mod store;
