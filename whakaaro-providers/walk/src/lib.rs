//! Adapter running an external random-walk opinion oracle as a child
//! process.
//!
//! The program is invoked as
//! `<program> <graph> <num_steps> <num_walks> <innate> <v1> <v2> ...` and
//! answers on standard output with its own running time in seconds on the
//! first line followed by one `vertex opinion` pair per line.

mod output;
mod process;

pub use output::parse_oracle_output;
pub use process::{DEFAULT_TIMEOUT, ProcessOracle};
