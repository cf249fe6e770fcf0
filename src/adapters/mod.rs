//! Recording collaborators
//!
//! The conversion core never decodes signals or writes the converted dataset
//! itself. These traits are the seams to whatever does: a [`RecordingSource`]
//! hands over the events and sample rate of one recording, an
//! [`IntervalSink`] receives the segmented intervals.

mod annotations;
mod event_log;

pub use annotations::JsonIntervalSink;
pub use event_log::EventLogSource;

use crate::error::ConvertError;
use crate::schema::RawEvent;
use crate::segmenter::Segmentation;

/// Events and timing of one recording
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Sampling frequency in Hz
    pub sample_rate: f64,
    /// Point events ordered by onset
    pub events: Vec<RawEvent>,
}

/// Trait for loading recordings
pub trait RecordingSource {
    /// Load the recording of `participant_id`
    fn load(&self, participant_id: &str) -> Result<Recording, ConvertError>;
}

/// Trait for consuming segmented recordings
pub trait IntervalSink {
    /// Store the intervals of `participant_id`
    fn write(&self, participant_id: &str, segmentation: &Segmentation) -> Result<(), ConvertError>;
}
