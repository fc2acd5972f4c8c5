//! Observable planner events
//!
//! Events are explicit and typed. Each carries the severity it is logged at.

use std::fmt;

use super::logger::Severity;

/// Events emitted while loading metadata, planning and executing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Planner configuration loaded
    ConfigLoaded,
    /// Domain definition loaded
    DomainLoaded,

    // Planning
    /// Access path chosen for a query
    QueryPlanned,
    /// Scan ran and returned rows
    QueryExecuted,
    /// Query failed before or during the scan
    QueryRejected,
    /// A conflicting mark dropped an index from consideration
    IndexExcluded,
    /// No index was usable, every leaf becomes a filter
    TableScanFallback,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DomainLoaded => "DOMAIN_LOADED",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::IndexExcluded => "INDEX_EXCLUDED",
            Event::TableScanFallback => "TABLE_SCAN_FALLBACK",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded | Event::DomainLoaded => Severity::Info,
            Event::QueryPlanned | Event::QueryExecuted => Severity::Trace,
            Event::TableScanFallback => Severity::Info,
            Event::IndexExcluded => Severity::Warn,
            Event::QueryRejected => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
