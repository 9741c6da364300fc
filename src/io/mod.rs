//! Input/output helpers.
//!
//! - processed panel CSV write/read (`panel`)

pub mod panel;

pub use panel::*;
