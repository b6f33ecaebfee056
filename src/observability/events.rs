//! Typed observability events

use std::fmt;

use super::logger::{Logger, Severity};

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Query path
    QueryBegin,
    QueryCompiled,
    QueryComplete,
    QueryRejected,
    ExplainComplete,

    // Dataset lifecycle
    DatasetAdded,
    DatasetRemoved,
    DatasetsLoaded,

    // Process
    ConfigLoaded,
    ServerStart,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryBegin => "QUERY_BEGIN",
            Event::QueryCompiled => "QUERY_COMPILED",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
            Event::DatasetAdded => "DATASET_ADDED",
            Event::DatasetRemoved => "DATASET_REMOVED",
            Event::DatasetsLoaded => "DATASETS_LOADED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerStart => "SERVER_START",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryRejected => Severity::Warn,
            Event::QueryBegin | Event::QueryCompiled => Severity::Trace,
            _ => Severity::Info,
        }
    }

    /// Logs this event at its default severity
    pub fn log(&self, fields: &[(&str, &str)]) {
        Logger::log(self.severity(), self.as_str(), fields);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
