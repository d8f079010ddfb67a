//! Filter operations
//!
//! This module provides windowed sums, box filters and the guided filter.

/// Vertical windowed sums over a prefix-sum table
mod windowed;
pub use windowed::*;

/// Square-window box sums and means
mod box_filter;
pub use box_filter::*;

/// Guided filter
mod guided;
pub use guided::*;
