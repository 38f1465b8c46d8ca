//! Analysis modules.
//!
//! Pure merging of collector output into report data.

pub mod aggregator;

pub use aggregator::*;
