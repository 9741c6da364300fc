//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw observations and per-series fetch specs (`Observation`, `SeriesSpec`)
//! - the joined daily panel (`Panel`, `PanelRow`)
//! - scoring outputs (`ScoredRow`, `TightnessLabel`)
//! - run configuration (`ReportConfig`, `ScoringConfig`)

pub mod types;

pub use types::*;
