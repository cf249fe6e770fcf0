//! Core types for the CAUEEG conversion
//!
//! This module defines the data structures that flow through each stage of the
//! conversion: tri-state indicators, derived clinical labels, split names and
//! the per-subject record that ends up in `participants.tsv`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value written to the participants table for missing cells
pub const MISSING: &str = "n/a";

/// A boolean flag that may also be explicitly missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Indicator {
    True,
    False,
    #[default]
    Missing,
}

impl Indicator {
    /// Parse a table cell. Returns `None` for cells that are not a boolean.
    pub fn parse(cell: &str) -> Option<Self> {
        match cell.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "1.0" | "yes" => Some(Indicator::True),
            "false" | "f" | "0" | "0.0" | "no" => Some(Indicator::False),
            "" | "n/a" | "na" | "nan" | "none" | "null" => Some(Indicator::Missing),
            _ => None,
        }
    }

    /// Missing counts as false. This is the only place that rule lives.
    pub fn is_set(self) -> bool {
        self == Indicator::True
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            Indicator::True => Some(true),
            Indicator::False => Some(false),
            Indicator::Missing => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Indicator::True => "True",
            Indicator::False => "False",
            Indicator::Missing => MISSING,
        }
    }
}

impl From<Option<bool>> for Indicator {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Indicator::True,
            Some(false) => Indicator::False,
            None => Indicator::Missing,
        }
    }
}

impl From<Indicator> for Option<bool> {
    fn from(value: Indicator) -> Self {
        value.as_option()
    }
}

impl From<bool> for Indicator {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

/// Named tri-state flags for one subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectIndicators {
    pub participant_id: String,
    pub flags: HashMap<String, Indicator>,
}

impl SubjectIndicators {
    pub fn new(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            flags: HashMap::new(),
        }
    }

    /// Builder-style flag setter, mostly useful in tests
    pub fn with(mut self, name: &str, value: impl Into<Indicator>) -> Self {
        self.flags.insert(name.to_string(), value.into());
        self
    }

    /// Flags whose column is absent read as missing
    pub fn get(&self, name: &str) -> Indicator {
        self.flags.get(name).copied().unwrap_or_default()
    }

    pub fn normal(&self) -> Indicator {
        self.get("normal")
    }

    pub fn mci(&self) -> Indicator {
        self.get("mci")
    }

    pub fn dementia(&self) -> Indicator {
        self.get("dementia")
    }
}

/// Dementia subtype, listed in clinical precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DementiaType {
    Ad,
    Vd,
    AdVdMixed,
    Ftd,
    ParkinsonDementia,
}

impl DementiaType {
    pub const PRIORITY: [DementiaType; 5] = [
        DementiaType::Ad,
        DementiaType::Vd,
        DementiaType::AdVdMixed,
        DementiaType::Ftd,
        DementiaType::ParkinsonDementia,
    ];

    /// Name of the indicator column and of the label value
    pub fn as_str(&self) -> &'static str {
        match self {
            DementiaType::Ad => "ad",
            DementiaType::Vd => "vd",
            DementiaType::AdVdMixed => "ad_vd_mixed",
            DementiaType::Ftd => "ftd",
            DementiaType::ParkinsonDementia => "parkinson_dementia",
        }
    }
}

/// Clinical status used by the dementia prediction task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DementiaLabel {
    Normal,
    Mci,
    Dementia,
}

impl DementiaLabel {
    pub const ALL: [DementiaLabel; 3] = [
        DementiaLabel::Normal,
        DementiaLabel::Mci,
        DementiaLabel::Dementia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DementiaLabel::Normal => "normal",
            DementiaLabel::Mci => "mci",
            DementiaLabel::Dementia => "dementia",
        }
    }
}

/// Binary label used by the abnormality prediction task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalityLabel {
    Normal,
    #[default]
    Abnormal,
}

impl NormalityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalityLabel::Normal => "normal",
            NormalityLabel::Abnormal => "abnormal",
        }
    }
}

/// Dataset partition a subject belongs to for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitName {
    Train,
    Val,
    Test,
}

impl SplitName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Val => "val",
            SplitName::Test => "test",
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction task a split definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitTask {
    /// normal / mci / dementia
    Dementia,
    /// normal / abnormal
    Normality,
}

impl SplitTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitTask::Dementia => "dementia",
            SplitTask::Normality => "normality",
        }
    }
}

impl fmt::Display for SplitTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a split allows the same participant in several partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    Standard,
    NoOverlap,
}

/// Split membership for both tasks under both overlap policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMembership {
    pub dementia_split: Option<SplitName>,
    pub dementia_split_no_overlap: Option<SplitName>,
    pub normality_split: Option<SplitName>,
    pub normality_split_no_overlap: Option<SplitName>,
}

impl SplitMembership {
    pub fn get(&self, task: SplitTask, policy: OverlapPolicy) -> Option<SplitName> {
        match (task, policy) {
            (SplitTask::Dementia, OverlapPolicy::Standard) => self.dementia_split,
            (SplitTask::Dementia, OverlapPolicy::NoOverlap) => self.dementia_split_no_overlap,
            (SplitTask::Normality, OverlapPolicy::Standard) => self.normality_split,
            (SplitTask::Normality, OverlapPolicy::NoOverlap) => self.normality_split_no_overlap,
        }
    }

    pub fn set(&mut self, task: SplitTask, policy: OverlapPolicy, split: Option<SplitName>) {
        let slot = match (task, policy) {
            (SplitTask::Dementia, OverlapPolicy::Standard) => &mut self.dementia_split,
            (SplitTask::Dementia, OverlapPolicy::NoOverlap) => &mut self.dementia_split_no_overlap,
            (SplitTask::Normality, OverlapPolicy::Standard) => &mut self.normality_split,
            (SplitTask::Normality, OverlapPolicy::NoOverlap) => {
                &mut self.normality_split_no_overlap
            }
        };
        *slot = split;
    }
}

/// One subject with its source row and derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Tri-state indicator flags keyed by column name
    pub indicators: SubjectIndicators,
    /// Raw source cells, aligned with the table header
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<String>,
    pub dementia_type: Option<DementiaType>,
    pub dementia_label: Option<DementiaLabel>,
    pub normality_label: NormalityLabel,
    pub splits: SplitMembership,
}

impl SubjectRecord {
    pub fn new(indicators: SubjectIndicators, cells: Vec<String>) -> Self {
        Self {
            indicators,
            cells,
            dementia_type: None,
            dementia_label: None,
            normality_label: NormalityLabel::default(),
            splits: SplitMembership::default(),
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.indicators.participant_id
    }

    /// Derived label a split definition for `task` is checked against
    pub fn task_label(&self, task: SplitTask) -> Option<&'static str> {
        match task {
            SplitTask::Dementia => self.dementia_label.map(|l| l.as_str()),
            SplitTask::Normality => Some(self.normality_label.as_str()),
        }
    }

    /// Derived columns in output order, nulls rendered as `n/a`
    pub fn derived_cells(&self) -> Vec<&'static str> {
        let split = |s: Option<SplitName>| s.map_or(MISSING, |s| s.as_str());
        vec![
            self.dementia_type.map_or(MISSING, |t| t.as_str()),
            self.dementia_label.map_or(MISSING, |l| l.as_str()),
            self.normality_label.as_str(),
            split(self.splits.dementia_split),
            split(self.splits.dementia_split_no_overlap),
            split(self.splits.normality_split),
            split(self.splits.normality_split_no_overlap),
        ]
    }
}

/// Names of the derived columns appended to the participants table
pub const DERIVED_COLUMNS: [&str; 7] = [
    "dementia_type",
    "dementia_label",
    "normality_label",
    "dementia_split",
    "dementia_split_no_overlap",
    "normality_split",
    "normality_split_no_overlap",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_parse() {
        assert_eq!(Indicator::parse("True"), Some(Indicator::True));
        assert_eq!(Indicator::parse(" 1 "), Some(Indicator::True));
        assert_eq!(Indicator::parse("FALSE"), Some(Indicator::False));
        assert_eq!(Indicator::parse(""), Some(Indicator::Missing));
        assert_eq!(Indicator::parse("n/a"), Some(Indicator::Missing));
        assert_eq!(Indicator::parse("NaN"), Some(Indicator::Missing));
        assert_eq!(Indicator::parse("maybe"), None);
    }

    #[test]
    fn test_missing_is_not_false() {
        let indicators = SubjectIndicators::new("00001").with("normal", Indicator::Missing);

        assert_eq!(indicators.normal(), Indicator::Missing);
        assert_ne!(indicators.normal(), Indicator::False);
        assert!(!indicators.normal().is_set());
        // Absent column
        assert_eq!(indicators.mci(), Indicator::Missing);
    }

    #[test]
    fn test_indicator_serde() {
        let values: Vec<Indicator> = serde_json::from_str("[true, false, null]").unwrap();
        assert_eq!(
            values,
            vec![Indicator::True, Indicator::False, Indicator::Missing]
        );
        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            "[true,false,null]"
        );
    }

    #[test]
    fn test_derived_cells() {
        let mut record = SubjectRecord::new(SubjectIndicators::new("00002"), Vec::new());
        record.dementia_label = Some(DementiaLabel::Dementia);
        record.splits.set(SplitTask::Dementia, OverlapPolicy::NoOverlap, Some(SplitName::Val));

        assert_eq!(
            record.derived_cells(),
            vec!["n/a", "dementia", "abnormal", "n/a", "val", "n/a", "n/a"]
        );
        assert_eq!(record.derived_cells().len(), DERIVED_COLUMNS.len());
        assert_eq!(
            record.splits.get(SplitTask::Dementia, OverlapPolicy::NoOverlap),
            Some(SplitName::Val)
        );
    }
}
