//! Completion marks for a fixed-size fan-out.
//!
//! A [`CompletionTracker`] is created with the number of results a coordinator
//! expects. Each worker calls [`CompletionTracker::set`] with its own position
//! when it finishes, and the registered listener runs exactly once, right after
//! the final position is marked.
//!
//! The marks, the remaining counter and the listener slot share one mutex, so the
//! "all marked" check and the hand-off of the listener happen atomically with
//! respect to the last `set`. The listener itself runs after the lock is
//! released and may call back into the tracker.
//!
//! Async code can also observe the INCOMPLETE to COMPLETE transition through a
//! `tokio::sync::watch` channel ([`CompletionTracker::subscribe`],
//! [`CompletionTracker::wait_complete`]) instead of registering a listener.
//!
//! # Example
//!
//! ```rust
//! use fanin_common::tracker::CompletionTracker;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let tracker = CompletionTracker::new(3);
//! let done = Arc::new(AtomicBool::new(false));
//! let flag = done.clone();
//! tracker.set_on_complete_listener(move || flag.store(true, Ordering::SeqCst));
//!
//! tracker.set(0).unwrap();
//! tracker.set(2).unwrap();
//! assert!(!done.load(Ordering::SeqCst));
//!
//! tracker.set(1).unwrap();
//! assert!(done.load(Ordering::SeqCst));
//! assert!(tracker.is_complete());
//! ```
//!
//! # Zero-size trackers
//!
//! `CompletionTracker::new(0)` is allowed. Nothing fires at construction and no
//! `set` can ever succeed on it, so a listener registered on it is dropped
//! without running. `is_complete()`
//! reports `true` (every one of zero marks is set) and the published phase starts
//! as [`CompletionPhase::Complete`].

use crate::error::TrackerError;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

type Listener = Box<dyn FnOnce() + Send + 'static>;

/// Observable progress of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPhase {
    /// At least one position is still unmarked
    Incomplete { remaining: usize },

    /// Every position is marked. Terminal.
    Complete,
}

impl CompletionPhase {
    fn for_remaining(remaining: usize) -> Self {
        if remaining == 0 {
            CompletionPhase::Complete
        } else {
            CompletionPhase::Incomplete { remaining }
        }
    }

    /// Returns true once every position has been marked
    pub fn is_complete(&self) -> bool {
        matches!(self, CompletionPhase::Complete)
    }

    /// Number of positions still unmarked
    pub fn remaining(&self) -> usize {
        match self {
            CompletionPhase::Incomplete { remaining } => *remaining,
            CompletionPhase::Complete => 0,
        }
    }
}

struct Marks {
    marked: Vec<bool>,
    remaining: usize,
    listener: Option<Listener>,
}

/// Tracks which of `total` expected completions have arrived.
///
/// Share it between workers with an `Arc`. Register the listener before handing
/// out positions; replacing it while the final `set` is in flight is not
/// supported (whichever listener occupies the slot at that moment is the one
/// that runs).
pub struct CompletionTracker {
    total: usize,
    marks: Mutex<Marks>,
    phase: watch::Sender<CompletionPhase>,
}

impl CompletionTracker {
    /// Creates a tracker expecting `total` completions, none marked.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            marks: Mutex::new(Marks {
                marked: vec![false; total],
                remaining: total,
                listener: None,
            }),
            phase: watch::Sender::new(CompletionPhase::for_remaining(total)),
        }
    }

    /// Number of completions this tracker expects
    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns whether `position` has been marked.
    ///
    /// # Errors
    ///
    /// [`TrackerError::PositionOutOfRange`] if `position >= total`.
    pub fn get(&self, position: usize) -> Result<bool, TrackerError> {
        self.check_position(position)?;
        Ok(self.lock().marked[position])
    }

    /// Marks `position` as complete.
    ///
    /// Marking an already-marked position does nothing. The call that marks the
    /// last unmarked position takes the listener out of its slot and runs it on
    /// the calling thread, after the tracker's lock has been released. If no
    /// listener is registered at that point the completion is only logged.
    ///
    /// # Errors
    ///
    /// [`TrackerError::PositionOutOfRange`] if `position >= total`.
    pub fn set(&self, position: usize) -> Result<(), TrackerError> {
        self.check_position(position)?;

        let listener = {
            let mut marks = self.lock();
            if marks.marked[position] {
                tracing::trace!(position, "completion mark already set");
                return Ok(());
            }
            marks.marked[position] = true;
            marks.remaining -= 1;

            if marks.remaining > 0 {
                let remaining = marks.remaining;
                self.phase
                    .send_replace(CompletionPhase::Incomplete { remaining });
                tracing::trace!(position, remaining, "completion mark set");
                return Ok(());
            }
            marks.listener.take()
        };

        // Waiters on the phase are released once the listener has returned, even
        // if it panics.
        let _publish = PublishComplete(&self.phase);
        tracing::debug!(position, total = self.total, "all completion marks set");
        match listener {
            Some(listener) => listener(),
            None => tracing::debug!(
                total = self.total,
                "all completion marks set but no listener is registered"
            ),
        }
        Ok(())
    }

    /// Registers the listener run when the last position is marked.
    ///
    /// A later registration replaces an earlier one. A tracker with nothing left
    /// to mark (already completed, or zero-size) can never run a listener, so
    /// the listener is dropped instead of stored.
    pub fn set_on_complete_listener<F>(&self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut marks = self.lock();
        if marks.remaining == 0 {
            drop(marks);
            tracing::debug!(
                total = self.total,
                "completion listener registered with nothing left to mark; dropping it"
            );
            drop(listener);
            return;
        }
        let previous = marks.listener.replace(Box::new(listener));
        drop(marks);
        // Dropped outside the lock: a listener's captures may call back into the tracker.
        if previous.is_some() {
            tracing::trace!("replaced previously registered completion listener");
        }
    }

    /// Returns true only if every position is marked.
    pub fn is_complete(&self) -> bool {
        let marks = self.lock();
        marks.marked.iter().all(|&marked| marked)
    }

    /// Number of positions marked so far
    pub fn marked_count(&self) -> usize {
        let marks = self.lock();
        self.total - marks.remaining
    }

    /// Positions that have not been marked yet, in ascending order
    pub fn pending_positions(&self) -> Vec<usize> {
        let marks = self.lock();
        marks
            .marked
            .iter()
            .enumerate()
            .filter_map(|(position, &marked)| (!marked).then_some(position))
            .collect()
    }

    /// Current phase without blocking
    pub fn phase(&self) -> CompletionPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes
    pub fn subscribe(&self) -> watch::Receiver<CompletionPhase> {
        self.phase.subscribe()
    }

    /// Wait until every position is marked and the listener (if any) has run.
    ///
    /// Returns immediately for a tracker that is already complete, including
    /// zero-size trackers. Never resolves if some position is never marked.
    pub async fn wait_complete(&self) {
        let mut rx = self.phase.subscribe();
        // The tracker owns the sender, so the channel cannot close while we borrow it.
        let _ = rx.wait_for(CompletionPhase::is_complete).await;
    }

    fn check_position(&self, position: usize) -> Result<(), TrackerError> {
        if position < self.total {
            Ok(())
        } else {
            Err(TrackerError::PositionOutOfRange {
                position,
                total: self.total,
            })
        }
    }

    fn lock(&self) -> MutexGuard<'_, Marks> {
        // Marks are only mutated by simple assignments, so a poisoned lock still
        // guards consistent state.
        self.marks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CompletionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks = self.lock();
        f.debug_struct("CompletionTracker")
            .field("total", &self.total)
            .field("marked", &marks.marked)
            .field("has_listener", &marks.listener.is_some())
            .finish()
    }
}

struct PublishComplete<'a>(&'a watch::Sender<CompletionPhase>);

impl Drop for PublishComplete<'_> {
    fn drop(&mut self) {
        self.0.send_replace(CompletionPhase::Complete);
    }
}
