//! Per-recording event log
//!
//! CAUEEG ships one JSON file per recording. Each row is an `[onset,
//! description]` pair where `onset` is a sample index; rows written as
//! `{"onset": .., "description": ..}` objects are accepted as well.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};

/// A point event as recorded by the acquisition system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EventRow")]
pub struct RawEvent {
    /// Sample index of the event
    pub onset: i64,
    /// Free-text annotation entered by the technician
    pub description: String,
}

impl RawEvent {
    pub fn new(onset: i64, description: impl Into<String>) -> Self {
        Self {
            onset,
            description: description.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventRow {
    Pair(i64, String),
    Object { onset: i64, description: String },
}

impl From<EventRow> for RawEvent {
    fn from(row: EventRow) -> Self {
        match row {
            EventRow::Pair(onset, description) => RawEvent { onset, description },
            EventRow::Object { onset, description } => RawEvent { onset, description },
        }
    }
}

/// Parse a JSON event log
pub fn parse_event_log(json: &str) -> Result<Vec<RawEvent>, ConvertError> {
    serde_json::from_str(json)
        .map_err(|e| ConvertError::ParseError(format!("Failed to parse event log: {}", e)))
}
