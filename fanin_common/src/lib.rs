//! Shared coordination primitives for fan-out work.
//!
//! - [`tracker::CompletionTracker`]: fixed-size completion marks with a single-shot
//!   completion listener and an observable [`tracker::CompletionPhase`].
//! - [`liveness::OwnerLiveness`]: explicit liveness flag that lets completion
//!   listeners skip work once their owner has gone away.

pub mod error;
pub mod liveness;
pub mod tracker;

pub use error::TrackerError;
pub use liveness::{LivenessToken, OwnerLiveness};
pub use tracker::{CompletionPhase, CompletionTracker};
