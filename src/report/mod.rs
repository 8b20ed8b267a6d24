//! Reporting: formatted terminal tables for each analysis.

pub mod format;

pub use format::*;
