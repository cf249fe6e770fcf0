//! Conversion configuration.
//!
//! [`ConversionConfig`] holds every path and constant the conversion needs.
//! The defaults match the layout of the published CAUEEG archive:
//!
//! ```text
//! sourcedata/caueeg-dataset/
//!   annotation.tsv
//!   dementia.json  dementia-no-overlap.json
//!   abnormal.json  abnormal-no-overlap.json
//!   event/<serial>.json
//! ```

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a full conversion run.
///
/// All fields are `pub` and default individually, so a JSON config file only
/// needs the keys it changes:
///
/// ```
/// use caueeg_bids::ConversionConfig;
///
/// let cfg: ConversionConfig = serde_json::from_str(r#"{"sample_rate": 250.0}"#).unwrap();
/// assert_eq!(cfg.sample_rate, 250.0);
/// assert_eq!(cfg.event_dir, "event");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Root of the extracted CAUEEG archive.
    ///
    /// Default: `sourcedata/caueeg-dataset`.
    pub source_dir: PathBuf,

    /// Directory the enriched participants table and annotations go to.
    ///
    /// Default: `rawdata`.
    pub output_dir: PathBuf,

    /// Subject annotation table, relative to `source_dir`.
    ///
    /// Tab-separated unless the extension is `.csv`.
    pub annotation_table: String,

    /// Directory of per-recording event logs, relative to `source_dir`.
    pub event_dir: String,

    /// Split files, relative to `source_dir`.
    pub dementia_split: String,
    pub dementia_split_no_overlap: String,
    pub normality_split: String,
    pub normality_split_no_overlap: String,

    /// Name of the enriched table inside `output_dir`.
    pub participants_file: String,

    /// Directory for per-recording interval files, relative to `output_dir`.
    pub annotations_dir: String,

    /// Sampling frequency reported for event logs, in Hz.
    ///
    /// Every CAUEEG recording is sampled at 200 Hz.
    pub sample_rate: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("sourcedata/caueeg-dataset"),
            output_dir: PathBuf::from("rawdata"),
            annotation_table: "annotation.tsv".to_string(),
            event_dir: "event".to_string(),
            dementia_split: "dementia.json".to_string(),
            dementia_split_no_overlap: "dementia-no-overlap.json".to_string(),
            normality_split: "abnormal.json".to_string(),
            normality_split_no_overlap: "abnormal-no-overlap.json".to_string(),
            participants_file: "participants.tsv".to_string(),
            annotations_dir: "annotations".to_string(),
            sample_rate: 200.0,
        }
    }
}

impl ConversionConfig {
    /// Load a (partial) configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConvertError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn annotation_table_path(&self) -> PathBuf {
        self.source_dir.join(&self.annotation_table)
    }

    pub fn event_dir_path(&self) -> PathBuf {
        self.source_dir.join(&self.event_dir)
    }

    pub fn dementia_split_path(&self) -> PathBuf {
        self.source_dir.join(&self.dementia_split)
    }

    pub fn dementia_split_no_overlap_path(&self) -> PathBuf {
        self.source_dir.join(&self.dementia_split_no_overlap)
    }

    pub fn normality_split_path(&self) -> PathBuf {
        self.source_dir.join(&self.normality_split)
    }

    pub fn normality_split_no_overlap_path(&self) -> PathBuf {
        self.source_dir.join(&self.normality_split_no_overlap)
    }

    pub fn participants_path(&self) -> PathBuf {
        self.output_dir.join(&self.participants_file)
    }

    pub fn annotations_dir_path(&self) -> PathBuf {
        self.output_dir.join(&self.annotations_dir)
    }
}
