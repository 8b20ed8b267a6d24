//! Input/output helpers.
//!
//! - population CSV ingest + validation (`ingest`)
//! - education-spending table loader (`spending`)
//! - enriched table exports (`export`)

pub mod export;
pub mod ingest;
pub mod spending;

pub use export::*;
pub use ingest::*;
pub use spending::*;
