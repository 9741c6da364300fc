//! `gas-tightness` library crate.
//!
//! The binary (`gt`) is a thin wrapper around this library so that:
//!
//! - the scoring and reporting logic is testable without spawning processes
//! - the data sources can be swapped for fakes in tests
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod report;
pub mod score;
