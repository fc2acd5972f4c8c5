//! Planner configuration
//!
//! Loaded from a JSON file. Omitted keys take their defaults; unknown keys
//! are rejected.
//!
//! ```json
//! { "tie_break": "prefer_in_list", "log_level": "info", "log_plans": true }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::query::{QueryError, QueryResult};

/// Which trailing bound wins when two ordered indexes bind the same number of columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// A range tail beats an in-list tail
    #[default]
    PreferRange,
    /// An in-list tail beats a range tail
    PreferInList,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::PreferRange => "prefer_range",
            TieBreak::PreferInList => "prefer_in_list",
        }
    }
}

/// Minimum severity written to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn severity(&self) -> Severity {
        match self {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

/// Planner configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    #[serde(default)]
    pub tie_break: TieBreak,

    #[serde(default)]
    pub log_level: LogLevel,

    /// Log every chosen plan at INFO
    #[serde(default)]
    pub log_plans: bool,
}

impl PlannerConfig {
    /// Loads and validates a configuration file
    pub fn load(path: &Path) -> QueryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_json(&content)?;

        let shown = path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", shown.as_str()),
                ("tie_break", config.tie_break.as_str()),
            ],
        );
        Ok(config)
    }

    /// Parses and validates a configuration document
    pub fn from_json(content: &str) -> QueryResult<Self> {
        let config: PlannerConfig = serde_json::from_str(content)
            .map_err(|e| QueryError::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.log_plans && self.log_level.severity() > Severity::Info {
            return Err(QueryError::Config(format!(
                "log_plans needs log_level 'info' or 'trace', got '{}'",
                self.log_level.severity().as_str().to_lowercase()
            )));
        }
        Ok(())
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Sets the process-wide log threshold from `log_level`
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level.severity());
    }
}
