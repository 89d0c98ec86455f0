//! HTTP API endpoint implementations.

pub mod route;
