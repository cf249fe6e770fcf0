//! File-based recording source
//!
//! Reads `<event_dir>/<participant_id>.json`. The event files do not carry
//! the sampling frequency, so a fixed rate is supplied.

use super::{Recording, RecordingSource};
use crate::error::ConvertError;
use crate::schema::parse_event_log;
use std::fs;
use std::path::PathBuf;

/// Recording source backed by a directory of JSON event logs
#[derive(Debug, Clone)]
pub struct EventLogSource {
    event_dir: PathBuf,
    sample_rate: f64,
}

impl EventLogSource {
    pub fn new(event_dir: impl Into<PathBuf>, sample_rate: f64) -> Self {
        Self {
            event_dir: event_dir.into(),
            sample_rate,
        }
    }

    pub fn event_path(&self, participant_id: &str) -> PathBuf {
        self.event_dir.join(format!("{}.json", participant_id))
    }
}

impl RecordingSource for EventLogSource {
    fn load(&self, participant_id: &str) -> Result<Recording, ConvertError> {
        let path = self.event_path(participant_id);
        let json = fs::read_to_string(&path).map_err(|e| {
            ConvertError::Recording(format!("cannot read {}: {}", path.display(), e))
        })?;

        Ok(Recording {
            sample_rate: self.sample_rate,
            events: parse_event_log(&json)?,
        })
    }
}
