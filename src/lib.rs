//! `ab-growth` library crate.
//!
//! The binary (`abg`) is a thin wrapper around this library so that:
//!
//! - the derivation pipeline is testable without spawning processes
//! - presentation (reports, plots, CLI) stays separate from the metrics
//!
//! Pipeline: `io::ingest` -> `series::filter` -> `series::join` ->
//! `metrics::derive` -> `io::export` / `report` / `plot`.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod series;
