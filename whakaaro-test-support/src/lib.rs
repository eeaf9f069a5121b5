//! Shared test utilities used across the whakaaro crates.

pub mod ci;
pub mod tracing;
