//! Library half of the `whakaaro` binary.
//!
//! Exposes the command pipeline so doctests and tests can run experiments
//! without spawning a process.

pub mod cli;
pub mod logging;
