//! Split assignment
//!
//! Maps participant ids to train / val / test for each task. A serial listed
//! in more than one list of the same definition resolves to the list applied
//! last (train, then validation, then test). That should never happen in a
//! well-formed definition, so every such collision is logged.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::schema::SplitDefinition;
use crate::types::{OverlapPolicy, SplitName, SplitTask, SubjectRecord};
use log::{debug, warn};
use std::collections::HashMap;

/// Lookup table from participant id to split
#[derive(Debug, Clone, Default)]
pub struct SplitIndex {
    assignments: HashMap<String, SplitName>,
}

impl SplitIndex {
    /// Build the index. Later lists override earlier ones.
    pub fn from_definition(definition: &SplitDefinition) -> Self {
        let mut assignments = HashMap::with_capacity(definition.len());

        for (split, _, entries) in definition.lists() {
            for entry in entries {
                if let Some(previous) = assignments.insert(entry.serial.clone(), split) {
                    if previous != split {
                        warn!(
                            "Participant {} listed in both {} and {} splits; using {}",
                            entry.serial, previous, split, split
                        );
                    }
                }
            }
        }

        Self { assignments }
    }

    /// Split of `participant_id`, or `None` if it is not listed
    pub fn assign(&self, participant_id: &str) -> Option<SplitName> {
        self.assignments.get(participant_id).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Split of `participant_id` in `definition`
pub fn assign(definition: &SplitDefinition, participant_id: &str) -> Option<SplitName> {
    SplitIndex::from_definition(definition).assign(participant_id)
}

/// The four split definitions shipped with the dataset
#[derive(Debug, Clone, Default)]
pub struct SplitDefinitions {
    pub dementia: SplitDefinition,
    pub dementia_no_overlap: SplitDefinition,
    pub normality: SplitDefinition,
    pub normality_no_overlap: SplitDefinition,
}

impl SplitDefinitions {
    /// Load all four definitions from the configured source directory
    pub fn load(config: &ConversionConfig) -> Result<Self, ConvertError> {
        Ok(Self {
            dementia: SplitDefinition::from_path(&config.dementia_split_path())?,
            dementia_no_overlap: SplitDefinition::from_path(
                &config.dementia_split_no_overlap_path(),
            )?,
            normality: SplitDefinition::from_path(&config.normality_split_path())?,
            normality_no_overlap: SplitDefinition::from_path(
                &config.normality_split_no_overlap_path(),
            )?,
        })
    }

    pub fn get(&self, task: SplitTask, policy: OverlapPolicy) -> &SplitDefinition {
        match (task, policy) {
            (SplitTask::Dementia, OverlapPolicy::Standard) => &self.dementia,
            (SplitTask::Dementia, OverlapPolicy::NoOverlap) => &self.dementia_no_overlap,
            (SplitTask::Normality, OverlapPolicy::Standard) => &self.normality,
            (SplitTask::Normality, OverlapPolicy::NoOverlap) => &self.normality_no_overlap,
        }
    }

    /// Every (task, policy, definition) combination
    pub fn iter(&self) -> impl Iterator<Item = (SplitTask, OverlapPolicy, &SplitDefinition)> {
        [
            (SplitTask::Dementia, OverlapPolicy::Standard),
            (SplitTask::Dementia, OverlapPolicy::NoOverlap),
            (SplitTask::Normality, OverlapPolicy::Standard),
            (SplitTask::Normality, OverlapPolicy::NoOverlap),
        ]
        .into_iter()
        .map(move |(task, policy)| (task, policy, self.get(task, policy)))
    }
}

/// Fill the four split fields of every record
pub fn assign_splits(records: &mut [SubjectRecord], definitions: &SplitDefinitions) {
    for (task, policy, definition) in definitions.iter() {
        let index = SplitIndex::from_definition(definition);
        debug!(
            "Assigning {} split ({:?}) from {} listed participants",
            task,
            policy,
            index.len()
        );

        for record in records.iter_mut() {
            let split = index.assign(record.participant_id());
            record.splits.set(task, policy, split);
        }
    }
}
