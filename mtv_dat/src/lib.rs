//! Command line front end for the MTV miner.
//!
//! Reads FIMI-style `.dat` transaction files and writes the mined summary
//! and per-iteration statistics for downstream tooling.

pub mod cli;
pub mod dat;
pub mod output;
