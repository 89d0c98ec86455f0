//! Utility functions for common type conversions and transformations.
//!
//! This module provides helpers for scaling token amounts between human and
//! smallest units and address formatting.

pub mod amounts;
pub mod formatting;

pub use amounts::{from_smallest_units, pow10, to_smallest_units};
pub use formatting::{normalize_address, truncate_id};
