//! JSON interval sink
//!
//! Writes one `sub-<participant_id>_annotations.json` file per recording with
//! the intervals as `{onset, duration, label}` objects in seconds.

use super::IntervalSink;
use crate::error::ConvertError;
use crate::segmenter::Segmentation;
use std::fs;
use std::path::PathBuf;

/// Interval sink writing one JSON file per recording
#[derive(Debug, Clone)]
pub struct JsonIntervalSink {
    out_dir: PathBuf,
    pretty: bool,
}

impl JsonIntervalSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            pretty: false,
        }
    }

    /// Pretty-print the written JSON
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn annotation_path(&self, participant_id: &str) -> PathBuf {
        self.out_dir
            .join(format!("sub-{}_annotations.json", participant_id))
    }
}

impl IntervalSink for JsonIntervalSink {
    fn write(&self, participant_id: &str, segmentation: &Segmentation) -> Result<(), ConvertError> {
        fs::create_dir_all(&self.out_dir)?;

        let json = if self.pretty {
            serde_json::to_string_pretty(&segmentation.intervals)?
        } else {
            serde_json::to_string(&segmentation.intervals)?
        };

        fs::write(self.annotation_path(participant_id), json)?;
        Ok(())
    }
}
