//! Common types module for the bridge router.
//!
//! This module defines the data types shared by every router component:
//! balances fetched from the balance provider, normalized bridge quotes,
//! optimizer selections and the HTTP request/response shapes. It also hosts
//! the configuration validation framework used by pluggable implementations.

/// API types for the HTTP endpoint and error responses.
pub mod api;
/// Token balances held by a user across chains.
pub mod balance;
/// Normalized bridge quotes and quote requests.
pub mod quote;
/// Self-registering implementation trait.
pub mod registry;
/// Secret string wrapper for API keys.
pub mod secret_string;
/// Optimizer output types.
pub mod selection;
/// Utility functions for amount scaling and formatting.
pub mod utils;
/// Configuration validation types for implementation tables.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use balance::*;
pub use quote::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use selection::*;
pub use utils::{from_smallest_units, normalize_address, pow10, to_smallest_units, truncate_id};
pub use validation::*;
