//! Input file schemas
//!
//! This module defines the external JSON inputs of a conversion: the
//! per-recording event logs and the train / validation / test split files.

mod event;
mod split;

pub use event::*;
pub use split::*;
