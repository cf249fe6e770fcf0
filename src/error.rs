//! Error types for the CAUEEG conversion

use crate::pipeline::ConversionReport;
use thiserror::Error;

/// Errors that can occur while deriving labels or segmenting recordings
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Events are not ordered by onset: event {index} at sample {current} follows sample {previous}")]
    Ordering {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("No closing marker for '{description}' (event {index} at sample {onset})")]
    UnresolvedSpan {
        index: usize,
        description: String,
        onset: i64,
    },

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Recording failed: {0}")]
    Recording(String),

    #[error("Conflicting labels for participant {participant_id}: {} are all set", flags.join(", "))]
    LabelConflict {
        participant_id: String,
        flags: Vec<String>,
    },

    #[error("Split '{task}' lists {participant_id} as '{expected}' in {list} but the derived label is '{derived}'")]
    Consistency {
        participant_id: String,
        task: String,
        list: String,
        expected: String,
        derived: String,
    },

    #[error("Split '{task}' references unknown participant {participant_id}")]
    UnknownSubject {
        participant_id: String,
        task: String,
    },

    #[error("Participant table error: {0}")]
    Table(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(String),

    /// The enriched table could not be written after the recordings were
    /// processed. The report of that run is kept.
    #[error(
        "Failed to write {path}: {message} ({}/{} recordings converted)",
        report.succeeded,
        report.attempted
    )]
    ParticipantsWrite {
        path: String,
        message: String,
        report: Box<ConversionReport>,
    },

    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Whether this error can only originate from a single recording.
    ///
    /// These never halt a run: the pipeline records them and moves on. I/O
    /// and parse errors are scoped by where they occur instead.
    pub fn is_recording_scoped(&self) -> bool {
        matches!(
            self,
            ConvertError::Ordering { .. }
                | ConvertError::UnresolvedSpan { .. }
                | ConvertError::InvalidSampleRate(_)
                | ConvertError::Recording(_)
        )
    }
}
