//! Observability
//!
//! Structured one-line JSON logs for planner events. Logging is read-only:
//! it never changes what a query plans or returns.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Logs an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Logs an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
