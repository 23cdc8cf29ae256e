//! Liveness-checked callbacks.
//!
//! An owner (a screen, session or controller) holds an [`OwnerLiveness`] and
//! hands [`LivenessToken`]s to anything that may call back into it later, such
//! as a completion listener. When the owner is dropped or shut down every token
//! reports it as gone, and guarded callbacks turn into no-ops instead of acting
//! on a torn-down owner.
//!
//! ```rust
//! use fanin_common::liveness::OwnerLiveness;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let owner = OwnerLiveness::new();
//! let refreshed = Arc::new(AtomicBool::new(false));
//! let flag = refreshed.clone();
//! let on_done = owner.token().guard(move || flag.store(true, Ordering::SeqCst));
//!
//! drop(owner);
//! on_done();
//! assert!(!refreshed.load(Ordering::SeqCst));
//! ```

use tokio_util::sync::CancellationToken;

/// Liveness flag held by the owner. Dropping it marks the owner as gone.
#[derive(Debug)]
pub struct OwnerLiveness {
    token: CancellationToken,
}

impl OwnerLiveness {
    /// Create a live owner
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token for callbacks that must not outlive the owner
    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            token: self.token.clone(),
        }
    }

    /// Mark the owner as gone without dropping it
    pub fn shut_down(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("owner shut down; guarded callbacks are now inert");
        }
        self.token.cancel();
    }

    pub fn is_alive(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Default for OwnerLiveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OwnerLiveness {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Cloneable view of an owner's liveness.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    token: CancellationToken,
}

impl LivenessToken {
    /// A token whose owner is already gone
    pub fn dead() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token }
    }

    pub fn is_alive(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Run `f` only while the owner is alive.
    ///
    /// The check happens once, before `f` starts; an owner shutting down while
    /// `f` runs does not interrupt it.
    pub fn run_if_alive<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        self.is_alive().then(f)
    }

    /// Wrap a callback so that it only runs while the owner is alive.
    pub fn guard<F>(&self, f: F) -> impl FnOnce() + Send + 'static + use<F>
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.clone();
        move || {
            if token.run_if_alive(f).is_none() {
                tracing::debug!("owner is gone; skipping guarded callback");
            }
        }
    }

    /// Resolves once the owner is gone
    pub async fn wait_dead(&self) {
        self.token.cancelled().await;
    }
}
