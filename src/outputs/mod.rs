//! Report writers.
//!
//! - [`json`]: writes [`crate::trends::TrendReport`] files for dashboard consumers

pub mod json;
