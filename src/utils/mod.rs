//! Utility modules shared by the stress engines
//!
//! - Grouping: row-index partitions by crop, state or (state, crop)
//! - Statistics: mean, sample std, interpolated quantile, rolling std
//! - Normalization: max-absolute scaling within groups
//! - LazyFrame helpers: column validation and projection

pub mod grouping;
pub mod stats;
pub mod normalization;
pub mod lazy_helpers;

// Re-export commonly used items
pub use grouping::{gather, Groups};
pub use normalization::{group_normalize, normalize_max_abs};
pub use lazy_helpers::{materialize_with_columns, missing_columns, require_columns};
