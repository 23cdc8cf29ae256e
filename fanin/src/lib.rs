//! # fanin
//!
//! Runs fan-outs of concurrent tokio tasks on top of
//! [`fanin_common::CompletionTracker`] and provides the `fanin` command-line tool.
//!
//! - [`fan_out`]: dispatch N tasks and wait for every completion mark
//! - [`config`]: TOML-backed run settings
//! - [`shell`]: command-line entry point
//! - [`utils::logging`]: `tracing` subscriber setup

pub mod config;
pub mod fan_out;
pub mod shell;
pub mod utils;

pub use config::{ConfigError, FanOutConfig};
pub use fan_out::{FanOutReport, run_with_delays};
