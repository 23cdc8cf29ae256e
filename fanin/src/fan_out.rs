//! # Fan-out Runner
//!
//! Dispatches one tokio task per completion mark and waits until every task has
//! reported. The completion listener is guarded by the caller's
//! [`LivenessToken`], so it does nothing once the owner of the run is gone.

use crate::config::{ConfigError, FanOutConfig};
use anyhow::{Context, Result};
use fanin_common::{CompletionTracker, LivenessToken};
use futures::future::join_all;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Outcome of a completed fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub tasks: usize,
    /// False when the owner went away before the last task finished
    pub callback_fired: bool,
    pub elapsed: Duration,
}

/// Run `config.tasks` tasks, each sleeping a random delay of at most
/// `config.max_delay_ms` before marking its position.
pub async fn run(config: &FanOutConfig, owner: LivenessToken) -> Result<FanOutReport> {
    config.validate()?;
    let delays = (0..config.tasks)
        .map(|_| random_delay(config.max_delay_ms))
        .collect();
    run_with_delays(delays, owner).await
}

/// Run one task per entry of `delays`; task `i` sleeps `delays[i]` and then marks position `i`.
///
/// # Errors
///
/// [`ConfigError::NoTasks`] if `delays` is empty.
pub async fn run_with_delays(delays: Vec<Duration>, owner: LivenessToken) -> Result<FanOutReport> {
    if delays.is_empty() {
        return Err(ConfigError::NoTasks.into());
    }
    let started = Instant::now();
    let tasks = delays.len();
    let tracker = Arc::new(CompletionTracker::new(tasks));

    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();
    tracker.set_on_complete_listener(owner.guard(move || {
        tracing::info!(tasks, "all fan-out tasks reported completion");
        flag.store(true, Ordering::SeqCst);
    }));

    tracing::debug!(tasks, "dispatching fan-out tasks");
    let handles: Vec<_> = delays
        .into_iter()
        .enumerate()
        .map(|(position, delay)| {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                tracing::trace!(position, ?delay, "fan-out task finished");
                tracker.set(position)
            })
        })
        .collect();

    for (position, joined) in join_all(handles).await.into_iter().enumerate() {
        joined
            .with_context(|| format!("Fan-out task {position} did not run to completion"))?
            .with_context(|| format!("Fan-out task {position} could not mark its completion"))?;
    }

    tracker.wait_complete().await;

    Ok(FanOutReport {
        tasks,
        callback_fired: fired.load(Ordering::SeqCst),
        elapsed: started.elapsed(),
    })
}

fn random_delay(max_delay_ms: u64) -> Duration {
    Duration::from_millis(rand::rng().random_range(0..=max_delay_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanin_common::OwnerLiveness;

    #[test]
    fn test_random_delay_bounds() {
        assert_eq!(random_delay(0), Duration::ZERO);
        for _ in 0..100 {
            assert!(random_delay(10) <= Duration::from_millis(10));
        }
    }

    #[tokio::test]
    async fn test_run_rejects_zero_tasks() {
        let owner = OwnerLiveness::new();
        let config = FanOutConfig {
            tasks: 0,
            ..FanOutConfig::default()
        };
        assert!(run(&config, owner.token()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_with_no_delays_rejected() {
        let owner = OwnerLiveness::new();
        let err = run_with_delays(Vec::new(), owner.token())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoTasks)
        ));
    }

    #[tokio::test]
    async fn test_run_with_reversed_delays() {
        let owner = OwnerLiveness::new();
        let delays = (0..5u64)
            .rev()
            .map(|step| Duration::from_millis(step * 5))
            .collect();

        let report = run_with_delays(delays, owner.token()).await.unwrap();

        assert_eq!(report.tasks, 5);
        assert!(report.callback_fired);
    }
}
