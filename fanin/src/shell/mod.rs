//! # Shell Module
//!
//! Entry point and argument handling for the `fanin` binary.

pub mod cli;

pub use cli::{Cli, run, run_until_interrupted};
