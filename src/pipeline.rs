//! Pipeline orchestration
//!
//! This module provides the public API for a conversion run. It orchestrates
//! the subject table (labels, splits, consistency) and the per-recording
//! segmentation.
//!
//! Subject-level work is all-or-nothing: any label conflict or split
//! disagreement aborts the run before a single recording is touched.
//! Recording-level work is isolated: a failing recording is logged, recorded
//! in the [`ConversionReport`] and the batch moves on.

use crate::adapters::{EventLogSource, IntervalSink, JsonIntervalSink, RecordingSource};
use crate::config::ConversionConfig;
use crate::consistency;
use crate::error::ConvertError;
use crate::labels::LabelDeriver;
use crate::participants::ParticipantTable;
use crate::segmenter::{self, Segmentation};
use crate::splits::{self, SplitDefinitions};
use crate::types::SubjectRecord;
use crate::{PRODUCER_NAME, VERSION};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A recording that could not be converted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectError {
    pub participant_id: String,
    pub message: String,
}

impl fmt::Display for SubjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error processing {}: {}", self.participant_id, self.message)
    }
}

/// Outcome of a conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub producer: String,
    pub version: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Recordings attempted
    pub attempted: usize,
    /// Recordings segmented and written
    pub succeeded: usize,
    pub errors: Vec<SubjectError>,
}

impl ConversionReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            producer: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
            run_id: Uuid::new_v4().to_string(),
            started_at: now,
            completed_at: now,
            attempted: 0,
            succeeded: 0,
            errors: Vec::new(),
        }
    }

    /// Every attempted recording was converted
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary, one line plus one line per error
    pub fn summary(&self) -> String {
        let mut out = format!(
            "BIDS conversion completed. {}/{} files were successfully processed.",
            self.succeeded, self.attempted
        );
        if !self.errors.is_empty() {
            out.push_str("\nErrors occurred for the following files:");
            for error in &self.errors {
                out.push('\n');
                out.push_str(&error.to_string());
            }
        }
        out
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Derive labels and splits for every subject, then check them against the
/// split definitions.
///
/// Stages:
/// 1. LabelDeriver - dementia type, dementia label, normality label
/// 2. SplitAssigner - four split fields
/// 3. ConsistencyValidator - split class names vs derived labels
pub fn prepare_subjects(
    records: &mut [SubjectRecord],
    definitions: &SplitDefinitions,
) -> Result<(), ConvertError> {
    for record in records.iter_mut() {
        LabelDeriver::derive(record)?;
    }

    splits::assign_splits(records, definitions);

    consistency::validate_all(records, definitions)?;

    info!("Derived labels and splits for {} participants", records.len());
    Ok(())
}

/// Load and segment one recording
pub fn segment_recording(
    source: &dyn RecordingSource,
    participant_id: &str,
) -> Result<Segmentation, ConvertError> {
    let recording = source.load(participant_id)?;
    segmenter::segment(&recording.events, recording.sample_rate)
}

/// Segment and write every subject's recording.
///
/// Failures are collected, never propagated.
pub fn convert_recordings(
    records: &[SubjectRecord],
    source: &dyn RecordingSource,
    sink: &dyn IntervalSink,
) -> ConversionReport {
    let mut report = ConversionReport::start();

    for record in records {
        let participant_id = record.participant_id();
        report.attempted += 1;

        let result = segment_recording(source, participant_id)
            .and_then(|segmentation| {
                debug!(
                    "{}: {} intervals, {} events dropped",
                    participant_id,
                    segmentation.len(),
                    segmentation.dropped
                );
                sink.write(participant_id, &segmentation)
            });

        match result {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                let error = SubjectError {
                    participant_id: participant_id.to_string(),
                    message: e.to_string(),
                };
                warn!("{}", error);
                report.errors.push(error);
            }
        }
    }

    report.completed_at = Utc::now();
    report
}

/// Run a full conversion with the file-based collaborators.
pub fn convert_dataset(config: &ConversionConfig) -> Result<ConversionReport, ConvertError> {
    let source = EventLogSource::new(config.event_dir_path(), config.sample_rate);
    let sink = JsonIntervalSink::new(config.annotations_dir_path());
    convert_with(config, &source, &sink)
}

/// Run a full conversion.
///
/// The enriched participants table is written once, after all recordings
/// were attempted. If that write fails the run's report is returned inside
/// [`ConvertError::ParticipantsWrite`].
pub fn convert_with(
    config: &ConversionConfig,
    source: &dyn RecordingSource,
    sink: &dyn IntervalSink,
) -> Result<ConversionReport, ConvertError> {
    let mut table = ParticipantTable::from_path(&config.annotation_table_path())?;
    let definitions = SplitDefinitions::load(config)?;

    info!(
        "Loaded {} participants from {}",
        table.len(),
        config.annotation_table_path().display()
    );

    prepare_subjects(&mut table.records, &definitions)?;

    info!("Converting {} recordings", table.len());
    let report = convert_recordings(&table.records, source, sink);

    let participants_path = config.participants_path();
    if let Err(e) = table.write_atomic(&participants_path) {
        error!("Failed to write {}: {}", participants_path.display(), e);
        return Err(ConvertError::ParticipantsWrite {
            path: participants_path.display().to_string(),
            message: e.to_string(),
            report: Box::new(report),
        });
    }
    info!("Wrote {}", participants_path.display());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Recording;
    use crate::schema::{RawEvent, SplitDefinition, SplitEntry};
    use crate::types::{DementiaLabel, SplitName, SubjectIndicators};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    struct MemorySource {
        recordings: HashMap<String, Recording>,
    }

    impl RecordingSource for MemorySource {
        fn load(&self, participant_id: &str) -> Result<Recording, ConvertError> {
            self.recordings
                .get(participant_id)
                .cloned()
                .ok_or_else(|| ConvertError::Recording("no such file".to_string()))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        written: RefCell<Vec<(String, usize)>>,
    }

    impl IntervalSink for MemorySink {
        fn write(&self, participant_id: &str, segmentation: &Segmentation) -> Result<(), ConvertError> {
            self.written
                .borrow_mut()
                .push((participant_id.to_string(), segmentation.len()));
            Ok(())
        }
    }

    fn record(id: &str) -> SubjectRecord {
        SubjectRecord::new(SubjectIndicators::new(id), Vec::new())
    }

    fn recording(rows: &[(i64, &str)]) -> Recording {
        Recording {
            sample_rate: 200.0,
            events: rows.iter().map(|(o, d)| RawEvent::new(*o, *d)).collect(),
        }
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let mut recordings = HashMap::new();
        recordings.insert(
            "00001".to_string(),
            recording(&[(0, "Eyes Open"), (400, "Paused"), (500, "blink")]),
        );
        // Out of order
        recordings.insert("00002".to_string(), recording(&[(10, "blink"), (5, "blink")]));
        // Never closed
        recordings.insert("00003".to_string(), recording(&[(0, "Photic On 3Hz")]));
        recordings.insert("00005".to_string(), recording(&[]));

        let source = MemorySource { recordings };
        let sink = MemorySink::default();
        let records: Vec<SubjectRecord> = ["00001", "00002", "00003", "00004", "00005"]
            .iter()
            .map(|id| record(id))
            .collect();

        let report = convert_recordings(&records, &source, &sink);

        assert_eq!(report.attempted, 5);
        assert_eq!(report.succeeded, 2);
        assert!(!report.is_complete());
        let failed: Vec<&str> = report
            .errors
            .iter()
            .map(|e| e.participant_id.as_str())
            .collect();
        assert_eq!(failed, vec!["00002", "00003", "00004"]);
        assert_eq!(
            sink.written.borrow().clone(),
            vec![("00001".to_string(), 2), ("00005".to_string(), 0)]
        );
    }

    #[test]
    fn test_summary() {
        let mut report = ConversionReport::start();
        report.attempted = 2;
        report.succeeded = 1;
        report.errors.push(SubjectError {
            participant_id: "00002".to_string(),
            message: "boom".to_string(),
        });

        assert_eq!(
            report.summary(),
            "BIDS conversion completed. 1/2 files were successfully processed.\n\
             Errors occurred for the following files:\n\
             Error processing 00002: boom"
        );
    }

    #[test]
    fn test_prepare_subjects() {
        let mut records = vec![
            SubjectRecord::new(SubjectIndicators::new("00001").with("normal", true), Vec::new()),
            SubjectRecord::new(SubjectIndicators::new("00002").with("dementia", true), Vec::new()),
        ];
        let definitions = SplitDefinitions {
            dementia: SplitDefinition {
                train_split: vec![SplitEntry::new("00001", "Normal")],
                test_split: vec![SplitEntry::new("00002", "Dementia")],
                ..Default::default()
            },
            ..Default::default()
        };

        prepare_subjects(&mut records, &definitions).unwrap();

        assert_eq!(records[1].dementia_label, Some(DementiaLabel::Dementia));
        assert_eq!(records[1].splits.dementia_split, Some(SplitName::Test));
        assert_eq!(records[0].splits.normality_split, None);
    }

    #[test]
    fn test_prepare_subjects_halts_on_conflict() {
        let mut records = vec![SubjectRecord::new(
            SubjectIndicators::new("00001")
                .with("normal", true)
                .with("dementia", true),
            Vec::new(),
        )];

        let result = prepare_subjects(&mut records, &SplitDefinitions::default());
        assert!(matches!(result, Err(ConvertError::LabelConflict { .. })));
    }

    fn write_dataset(root: &std::path::Path, abnormal_class_for_2: &str) {
        fs::create_dir_all(root.join("event")).unwrap();
        fs::write(
            root.join("annotation.tsv"),
            "serial\tage\tnormal\tmci\tdementia\tad\tvd\n\
             00001\t70\tTrue\tFalse\tFalse\t\t\n\
             00002\t75\tFalse\tFalse\tTrue\tFalse\tTrue\n",
        )
        .unwrap();

        let dementia = r#"{"train_split": [{"serial": "00001", "class_name": "Normal"}],
                          "validation_split": [],
                          "test_split": [{"serial": "00002", "class_name": "Dementia"}]}"#;
        let abnormal = format!(
            r#"{{"train_split": [{{"serial": "00001", "class_name": "Normal"}},
                                 {{"serial": "00002", "class_name": "{}"}}],
                "validation_split": [], "test_split": []}}"#,
            abnormal_class_for_2
        );
        fs::write(root.join("dementia.json"), dementia).unwrap();
        fs::write(root.join("dementia-no-overlap.json"), dementia).unwrap();
        fs::write(root.join("abnormal.json"), &abnormal).unwrap();
        fs::write(root.join("abnormal-no-overlap.json"), r#"{"train_split": []}"#).unwrap();

        fs::write(
            root.join("event").join("00001.json"),
            r#"[[0, "Start Recording"], [200, "Eyes Open"], [1200, "Eyes Closed"], [2200, "Paused"]]"#,
        )
        .unwrap();
    }

    #[test]
    fn test_convert_dataset() {
        let source_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_dataset(source_dir.path(), "Abnormal");

        let config = ConversionConfig {
            source_dir: source_dir.path().to_path_buf(),
            output_dir: output_dir.path().to_path_buf(),
            ..Default::default()
        };

        let report = convert_dataset(&config).unwrap();

        // 00002 has no event log
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errors[0].participant_id, "00002");

        let participants = fs::read_to_string(config.participants_path()).unwrap();
        let lines: Vec<&str> = participants.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("participant_id\tage\t"));
        assert!(lines[1].ends_with("n/a\tnormal\tnormal\ttrain\ttrain\ttrain\tn/a"));
        assert!(lines[2].ends_with("vd\tdementia\tabnormal\ttest\ttest\ttrain\tn/a"));

        let annotations = fs::read_to_string(
            config
                .annotations_dir_path()
                .join("sub-00001_annotations.json"),
        )
        .unwrap();
        let intervals: serde_json::Value = serde_json::from_str(&annotations).unwrap();
        assert_eq!(intervals.as_array().unwrap().len(), 2);
        assert_eq!(intervals[0]["onset"], 1.0);
        assert_eq!(intervals[0]["duration"], 5.0);
    }

    #[test]
    fn test_failed_table_write_keeps_report() {
        let source_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_dataset(source_dir.path(), "Abnormal");

        let config = ConversionConfig {
            source_dir: source_dir.path().to_path_buf(),
            output_dir: output_dir.path().to_path_buf(),
            ..Default::default()
        };
        // A non-empty directory where the table should go
        fs::create_dir_all(config.participants_path().join("occupied")).unwrap();

        match convert_dataset(&config) {
            Err(ConvertError::ParticipantsWrite { report, .. }) => {
                assert_eq!(report.attempted, 2);
                assert_eq!(report.succeeded, 1);
                assert_eq!(report.errors[0].participant_id, "00002");
            }
            other => panic!("expected a table write error, got {:?}", other),
        }
        assert!(config
            .annotations_dir_path()
            .join("sub-00001_annotations.json")
            .exists());
        assert!(!config.participants_path().with_extension("tsv.tmp").exists());
    }

    #[test]
    fn test_convert_dataset_halts_on_inconsistent_split() {
        let source_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_dataset(source_dir.path(), "Normal");

        let config = ConversionConfig {
            source_dir: source_dir.path().to_path_buf(),
            output_dir: output_dir.path().to_path_buf(),
            ..Default::default()
        };

        let result = convert_dataset(&config);

        assert!(matches!(result, Err(ConvertError::Consistency { .. })));
        assert!(!config.participants_path().exists());
        assert!(!config.annotations_dir_path().exists());
    }
}
