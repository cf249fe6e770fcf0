//! Split / label consistency checks
//!
//! Every entry of an external split definition records the class the split
//! was built from. That class must agree with the label derived from the
//! subject's indicators, otherwise the ground truth cannot be trusted.

use crate::error::ConvertError;
use crate::schema::SplitDefinition;
use crate::splits::SplitDefinitions;
use crate::types::{SplitTask, SubjectRecord};
use log::debug;
use std::collections::HashMap;

/// Check one split definition against derived labels.
///
/// # Errors
/// * [`ConvertError::UnknownSubject`] if an entry names a participant that is
///   not in `records`
/// * [`ConvertError::Consistency`] on the first `class_name` that differs
///   (case-insensitively) from the derived label
pub fn validate(
    records: &[SubjectRecord],
    task: SplitTask,
    definition: &SplitDefinition,
) -> Result<(), ConvertError> {
    let by_id: HashMap<&str, &SubjectRecord> =
        records.iter().map(|r| (r.participant_id(), r)).collect();

    for (_, list, entries) in definition.lists() {
        for entry in entries {
            let record = by_id.get(entry.serial.as_str()).ok_or_else(|| {
                ConvertError::UnknownSubject {
                    participant_id: entry.serial.clone(),
                    task: task.to_string(),
                }
            })?;

            let derived = record.task_label(task);
            let expected = entry.class_name.to_lowercase();

            if derived != Some(expected.as_str()) {
                return Err(ConvertError::Consistency {
                    participant_id: entry.serial.clone(),
                    task: task.to_string(),
                    list: list.to_string(),
                    expected: entry.class_name.clone(),
                    derived: derived.unwrap_or("none").to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Check all four split definitions
pub fn validate_all(
    records: &[SubjectRecord],
    definitions: &SplitDefinitions,
) -> Result<(), ConvertError> {
    for (task, policy, definition) in definitions.iter() {
        validate(records, task, definition)?;
        debug!(
            "{} split ({:?}) agrees with derived labels for {} entries",
            task,
            policy,
            definition.len()
        );
    }
    Ok(())
}
