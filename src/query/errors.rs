//! Query error types
//!
//! Error codes:
//! - QUERY_USAGE (REJECT)
//! - QUERY_CONFLICTING_BOUND (RECOVERABLE)
//! - QUERY_UNBOUND_PARAMETER (REJECT)
//! - QUERY_TYPE_MISMATCH (REJECT)
//! - QUERY_INVALID_DOMAIN (REJECT)
//! - QUERY_CONFIG_INVALID (REJECT)
//! - QUERY_STORAGE_FAILED (ERROR)

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected before any storage call
    Reject,
    /// Handled inside the planner, the query proceeds
    Recoverable,
    /// The storage engine failed while running the scan
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Recoverable => write!(f, "RECOVERABLE"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    Usage,
    ConflictingBound,
    UnboundParameter,
    TypeMismatch,
    InvalidDomain,
    ConfigInvalid,
    StorageFailed,
}

impl QueryErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::Usage => "QUERY_USAGE",
            QueryErrorCode::ConflictingBound => "QUERY_CONFLICTING_BOUND",
            QueryErrorCode::UnboundParameter => "QUERY_UNBOUND_PARAMETER",
            QueryErrorCode::TypeMismatch => "QUERY_TYPE_MISMATCH",
            QueryErrorCode::InvalidDomain => "QUERY_INVALID_DOMAIN",
            QueryErrorCode::ConfigInvalid => "QUERY_CONFIG_INVALID",
            QueryErrorCode::StorageFailed => "QUERY_STORAGE_FAILED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            QueryErrorCode::ConflictingBound => Severity::Recoverable,
            QueryErrorCode::StorageFailed => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query building, planning and execution errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The caller broke the builder contract
    #[error("{0}")]
    Usage(String),

    /// Two predicate leaves bound the same index column incompatibly
    #[error(
        "Conflicting bounds on index '{index}' column '{column}' (position {position}): \
         {existing} already set, cannot add {attempted}"
    )]
    ConflictingBound {
        index: String,
        column: String,
        position: usize,
        existing: &'static str,
        attempted: &'static str,
    },

    #[error("Parameter '{0}' has no bound value")]
    UnboundParameter(String),

    #[error("Column '{column}' expects {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("Invalid domain type: {0}")]
    InvalidDomain(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl QueryError {
    /// A comparison was handed something other than a parameter
    pub fn only_parameters(operation: &str) -> Self {
        QueryError::Usage(format!(
            "Only parameters are allowed as the operand of '{}'",
            operation
        ))
    }

    pub fn unknown_field(domain: &str, field: &str) -> Self {
        QueryError::Usage(format!(
            "Domain type '{}' has no field '{}'",
            domain, field
        ))
    }

    pub fn code(&self) -> QueryErrorCode {
        match self {
            QueryError::Usage(_) => QueryErrorCode::Usage,
            QueryError::ConflictingBound { .. } => QueryErrorCode::ConflictingBound,
            QueryError::UnboundParameter(_) => QueryErrorCode::UnboundParameter,
            QueryError::TypeMismatch { .. } => QueryErrorCode::TypeMismatch,
            QueryError::InvalidDomain(_) => QueryErrorCode::InvalidDomain,
            QueryError::Config(_) => QueryErrorCode::ConfigInvalid,
            QueryError::Storage(_) => QueryErrorCode::StorageFailed,
        }
    }

    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// Only storage failures abort a query after it reached the engine
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, QueryError::Usage(_))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(QueryError::only_parameters("equal").code().code(), "QUERY_USAGE");
        assert_eq!(
            QueryError::UnboundParameter("p".into()).code().code(),
            "QUERY_UNBOUND_PARAMETER"
        );
        assert_eq!(
            QueryError::from(StoreError::UnknownTable("t".into())).code().code(),
            "QUERY_STORAGE_FAILED"
        );
    }

    #[test]
    fn test_conflict_is_recoverable() {
        let err = QueryError::ConflictingBound {
            index: "idx".into(),
            column: "a".into(),
            position: 0,
            existing: "equal",
            attempted: "lower",
        };
        assert_eq!(err.severity(), Severity::Recoverable);
        assert!(!err.is_fatal());
        let display = format!("{}", err);
        assert!(display.contains("idx"));
        assert!(display.contains("equal"));
    }

    #[test]
    fn test_only_parameters_message() {
        let err = QueryError::only_parameters("between");
        assert!(err.is_usage());
        assert!(format!("{}", err).contains("'between'"));
    }

    #[test]
    fn test_storage_failure_is_fatal() {
        let err = QueryError::from(StoreError::InvalidBound("x".into()));
        assert!(err.is_fatal());
        assert_eq!(err.severity(), Severity::Error);
    }
}
