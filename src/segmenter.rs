//! Event segmentation
//!
//! Turns the free-text point events of one recording into labeled intervals.
//! Classification runs through an ordered rule table: span rules first, then
//! instantaneous markers, first match wins. Matching is case-insensitive.
//!
//! | Opening description                | Closed by (first later match)        |
//! |------------------------------------|--------------------------------------|
//! | `Eyes Open`, `Eyes Closed`         | `Eyes Open`, `Eyes Closed`, `Paused` |
//! | starts with `Photic On`            | `Photic Off`, `Paused`               |
//! | starts with `HV`, ends with `On`   | `HV - Off`, `Paused`                 |
//!
//! Span intervals keep the original description as their label. Markers get a
//! canonical label and a zero duration. Events matching no rule are dropped.

use crate::error::ConvertError;
use crate::schema::RawEvent;
use serde::{Deserialize, Serialize};

/// A labeled time interval, in seconds from the start of the recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub onset: f64,
    pub duration: f64,
    pub label: String,
}

/// Result of segmenting one recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub intervals: Vec<Interval>,
    /// Number of input events that matched no rule
    pub dropped: usize,
}

impl Segmentation {
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn onsets(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.onset).collect()
    }

    pub fn durations(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.duration).collect()
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.intervals.iter().map(|i| i.label.as_str()).collect()
    }
}

/// How a lowercased description is recognised
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Equals one of the needles
    Exact(&'static [&'static str]),
    /// Starts with `prefix` and ends with `suffix`
    Affix {
        prefix: &'static str,
        suffix: &'static str,
    },
    /// Contains one of the needles
    Contains(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, description: &str) -> bool {
        match self {
            Matcher::Exact(needles) => needles.contains(&description),
            Matcher::Affix { prefix, suffix } => {
                description.starts_with(prefix) && description.ends_with(suffix)
            }
            Matcher::Contains(needles) => needles.iter().any(|n| description.contains(n)),
        }
    }
}

/// What a matched event turns into
#[derive(Debug, Clone, Copy)]
enum Handler {
    /// Runs until the first later event whose description equals a closer
    Span { closers: &'static [&'static str] },
    /// Zero-duration marker with a canonical label
    Marker { label: &'static str },
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    matcher: Matcher,
    handler: Handler,
}

// All needles are lowercase.
const RULES: &[Rule] = &[
    Rule {
        matcher: Matcher::Exact(&["eyes open", "eyes closed"]),
        handler: Handler::Span {
            closers: &["eyes open", "eyes closed", "paused"],
        },
    },
    Rule {
        matcher: Matcher::Affix {
            prefix: "photic on",
            suffix: "",
        },
        handler: Handler::Span {
            closers: &["photic off", "paused"],
        },
    },
    Rule {
        matcher: Matcher::Affix {
            prefix: "hv",
            suffix: "on",
        },
        handler: Handler::Span {
            closers: &["hv - off", "paused"],
        },
    },
    Rule {
        matcher: Matcher::Contains(&["drowsy"]),
        handler: Handler::Marker { label: "drowsy" },
    },
    Rule {
        matcher: Matcher::Contains(&["cough", "couch"]),
        handler: Handler::Marker { label: "cough" },
    },
    Rule {
        matcher: Matcher::Contains(&["chew"]),
        handler: Handler::Marker { label: "chewing" },
    },
    Rule {
        matcher: Matcher::Contains(&["sweat"]),
        handler: Handler::Marker { label: "sweating" },
    },
    Rule {
        matcher: Matcher::Contains(&["blink"]),
        handler: Handler::Marker { label: "eye blink" },
    },
    Rule {
        matcher: Matcher::Contains(&["eye movement"]),
        handler: Handler::Marker {
            label: "eye movement",
        },
    },
    Rule {
        matcher: Matcher::Contains(&["move", "jerk"]),
        handler: Handler::Marker { label: "movement" },
    },
    Rule {
        matcher: Matcher::Contains(&["seizure"]),
        handler: Handler::Marker { label: "seizure" },
    },
    Rule {
        matcher: Matcher::Contains(&["artifact"]),
        handler: Handler::Marker { label: "artifact" },
    },
];

fn classify(description: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matcher.matches(description))
}

/// Segment one recording's events into labeled intervals.
///
/// # Arguments
/// * `events` - Point events, ordered by onset (sample index)
/// * `sample_rate` - Sampling frequency of the recording in Hz
///
/// # Errors
/// * [`ConvertError::InvalidSampleRate`] if the rate is not positive and finite
/// * [`ConvertError::Ordering`] if an onset is smaller than the one before it
/// * [`ConvertError::UnresolvedSpan`] if a span opener is never closed
pub fn segment(events: &[RawEvent], sample_rate: f64) -> Result<Segmentation, ConvertError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(ConvertError::InvalidSampleRate(sample_rate));
    }
    check_ordering(events)?;

    let lowered: Vec<String> = events.iter().map(|e| e.description.to_lowercase()).collect();

    let mut segmentation = Segmentation::default();

    for (index, event) in events.iter().enumerate() {
        let rule = match classify(&lowered[index]) {
            Some(rule) => rule,
            None => {
                segmentation.dropped += 1;
                continue;
            }
        };

        let onset = event.onset as f64 / sample_rate;

        let interval = match rule.handler {
            Handler::Span { closers } => {
                let duration = span_duration(events, &lowered, index, closers, sample_rate)
                    .ok_or_else(|| ConvertError::UnresolvedSpan {
                        index,
                        description: event.description.clone(),
                        onset: event.onset,
                    })?;
                Interval {
                    onset,
                    duration,
                    label: event.description.clone(),
                }
            }
            Handler::Marker { label } => Interval {
                onset,
                duration: 0.0,
                label: label.to_string(),
            },
        };

        segmentation.intervals.push(interval);
    }

    Ok(segmentation)
}

fn check_ordering(events: &[RawEvent]) -> Result<(), ConvertError> {
    match events.windows(2).position(|pair| pair[1].onset < pair[0].onset) {
        Some(i) => Err(ConvertError::Ordering {
            index: i + 1,
            previous: events[i].onset,
            current: events[i + 1].onset,
        }),
        None => Ok(()),
    }
}

/// Duration from the opener at `opening` to the first later closer.
///
/// Onsets are subtracted as `f64`; any two `i64` sample indices are valid.
fn span_duration(
    events: &[RawEvent],
    lowered: &[String],
    opening: usize,
    closers: &[&str],
    sample_rate: f64,
) -> Option<f64> {
    lowered
        .iter()
        .enumerate()
        .skip(opening + 1)
        .find(|(_, description)| closers.contains(&description.as_str()))
        .map(|(closing, _)| {
            (events[closing].onset as f64 - events[opening].onset as f64) / sample_rate
        })
}
