//! CAUEEG to BIDS - labeling core for the CAUEEG clinical EEG archive
//!
//! Converts the archive's metadata into a labeled BIDS dataset through a
//! deterministic pipeline: participant table → label derivation → split
//! assignment → consistency validation → per-recording event segmentation.
//!
//! ## Modules
//!
//! - **Subject pipeline**: derive dementia / normality labels and train / val /
//!   test membership for every participant, checked against the published
//!   split files
//! - **Recording pipeline**: turn each recording's free-text event log into
//!   labeled intervals for an external BIDS writer

pub mod adapters;
pub mod config;
pub mod consistency;
pub mod error;
pub mod labels;
pub mod participants;
pub mod pipeline;
pub mod schema;
pub mod segmenter;
pub mod splits;
pub mod types;

pub use config::ConversionConfig;
pub use error::ConvertError;
pub use labels::LabelDeriver;
pub use participants::ParticipantTable;
pub use pipeline::{convert_dataset, convert_with, ConversionReport};
pub use segmenter::{segment, Interval, Segmentation};
pub use splits::{SplitDefinitions, SplitIndex};

// Schema exports
pub use schema::{RawEvent, SplitDefinition, SplitEntry};

/// Crate version, recorded in conversion reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name
pub const PRODUCER_NAME: &str = "caueeg-bids";
