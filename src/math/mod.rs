//! Numerical utilities: trailing-window statistics.

pub mod rolling;

pub use rolling::*;
