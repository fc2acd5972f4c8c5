//! CLI-specific error types

use std::fmt;
use std::io;

use crate::query::{QueryError, QueryErrorCode};
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Domain definition error
    DomainError,
    /// Query document could not be built or run
    QueryError,
    /// Data file rows rejected by the store
    DataError,
    /// I/O error (files, stdout)
    IoError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CLI_CONFIG_ERROR",
            Self::DomainError => "CLI_DOMAIN_ERROR",
            Self::QueryError => "CLI_QUERY_ERROR",
            Self::DataError => "CLI_DATA_ERROR",
            Self::IoError => "CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn domain_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::DomainError, msg)
    }

    pub fn query_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::QueryError, msg)
    }

    pub fn data_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::DataError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        let message = format!("{}: {}", e.code().code(), e);
        match e.code() {
            QueryErrorCode::ConfigInvalid => Self::config_error(message),
            QueryErrorCode::InvalidDomain => Self::domain_error(message),
            _ => Self::query_error(message),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::data_error(format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_mapping() {
        let err = CliError::from(QueryError::Config("bad".into()));
        assert_eq!(err.code_str(), "CLI_CONFIG_ERROR");
        assert!(err.message().contains("QUERY_CONFIG_INVALID"));

        let err = CliError::from(QueryError::InvalidDomain("bad".into()));
        assert_eq!(err.code(), &CliErrorCode::DomainError);

        let err = CliError::from(QueryError::UnboundParameter("p".into()));
        assert_eq!(err.code_str(), "CLI_QUERY_ERROR");
    }

    #[test]
    fn test_store_error_mapping() {
        let err = CliError::from(StoreError::InvalidRow("duplicate key".into()));
        assert_eq!(err.code(), &CliErrorCode::DataError);
        assert_eq!(err.code_str(), "CLI_DATA_ERROR");
        assert!(err.message().contains("STORE_INVALID_ROW"));
    }
}
