//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and filtered series (`RawObservation`, `FilteredSeries`)
//! - join/derivation records (`JoinedRecord`, `EnrichedRecord`)
//! - the spending dataset and the wide analysis tables
//! - run configuration structs built from CLI flags

pub mod types;

pub use types::*;
