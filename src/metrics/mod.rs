//! Metric derivation over joined year-keyed records.

pub mod derive;

pub use derive::*;
