//! Benchmark support for whakaaro.
//!
//! Generates seeded synthetic opinion networks for the Criterion benchmarks
//! of weighted neighbour sampling and innate-opinion estimation.

pub mod error;
pub mod params;
pub mod synthetic;
