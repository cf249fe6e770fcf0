//! External split definition files
//!
//! Each task ships a JSON file with `train_split`, `validation_split` and
//! `test_split` lists. Entries carry the subject `serial` and the
//! `class_name` the split was built from; other keys are ignored.

use crate::error::ConvertError;
use crate::types::SplitName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One subject in a split list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitEntry {
    pub serial: String,
    pub class_name: String,
}

impl SplitEntry {
    pub fn new(serial: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            class_name: class_name.into(),
        }
    }
}

/// Train / validation / test partition for one task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDefinition {
    #[serde(default)]
    pub train_split: Vec<SplitEntry>,
    #[serde(default)]
    pub validation_split: Vec<SplitEntry>,
    #[serde(default)]
    pub test_split: Vec<SplitEntry>,
}

impl SplitDefinition {
    /// Parse a split definition from JSON
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a split definition file
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| {
            ConvertError::ParseError(format!("{}: {}", path.display(), e))
        })
    }

    /// The three lists in application order, with the split they map to and
    /// the key they are stored under
    pub fn lists(&self) -> [(SplitName, &'static str, &[SplitEntry]); 3] {
        [
            (SplitName::Train, "train_split", self.train_split.as_slice()),
            (SplitName::Val, "validation_split", self.validation_split.as_slice()),
            (SplitName::Test, "test_split", self.test_split.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.train_split.len() + self.validation_split.len() + self.test_split.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
