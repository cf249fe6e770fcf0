//! Clinical label derivation
//!
//! Derives the dementia subtype, the normal / mci / dementia status and the
//! normal / abnormal label from a subject's tri-state indicators. Missing
//! indicators count as false here and nowhere else.

use crate::error::ConvertError;
use crate::types::{DementiaLabel, DementiaType, NormalityLabel, SubjectIndicators, SubjectRecord};

/// Label deriver for subject records
pub struct LabelDeriver;

impl LabelDeriver {
    /// Fill all derived label fields of a record
    pub fn derive(record: &mut SubjectRecord) -> Result<(), ConvertError> {
        record.dementia_type = dementia_type(&record.indicators);
        record.dementia_label = dementia_label(&record.indicators)?;
        record.normality_label = normality_label(&record.indicators);
        Ok(())
    }
}

/// First subtype flag set, in clinical precedence order.
///
/// Several subtype flags may be set at once; the priority picks one. A subject
/// diagnosed with dementia but without any subtype flag has no subtype.
pub fn dementia_type(indicators: &SubjectIndicators) -> Option<DementiaType> {
    DementiaType::PRIORITY
        .into_iter()
        .find(|t| indicators.get(t.as_str()).is_set())
}

/// The single status flag set among `normal`, `mci` and `dementia`.
///
/// # Errors
/// [`ConvertError::LabelConflict`] when more than one of them is set.
pub fn dementia_label(
    indicators: &SubjectIndicators,
) -> Result<Option<DementiaLabel>, ConvertError> {
    let set: Vec<DementiaLabel> = DementiaLabel::ALL
        .into_iter()
        .filter(|l| indicators.get(l.as_str()).is_set())
        .collect();

    match set.as_slice() {
        [] => Ok(None),
        [label] => Ok(Some(*label)),
        _ => Err(ConvertError::LabelConflict {
            participant_id: indicators.participant_id.clone(),
            flags: set.iter().map(|l| l.as_str().to_string()).collect(),
        }),
    }
}

/// Normal only when `normal` is set; abnormal is the default.
pub fn normality_label(indicators: &SubjectIndicators) -> NormalityLabel {
    if indicators.normal().is_set() {
        NormalityLabel::Normal
    } else {
        NormalityLabel::Abnormal
    }
}
