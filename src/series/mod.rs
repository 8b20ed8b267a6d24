//! Series extraction and alignment.
//!
//! - filtering raw rows into year-keyed series (`filter`)
//! - left-joining two series on year (`join`)

pub mod filter;
pub mod join;

pub use filter::*;
pub use join::*;
