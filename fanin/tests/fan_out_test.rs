//! Integration tests for the fan-out runner and liveness-guarded completion.

use fanin::{FanOutConfig, fan_out, run_with_delays};
use fanin_common::{LivenessToken, OwnerLiveness};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_fires_listener_once_for_all_tasks() {
    let owner = OwnerLiveness::new();
    let config = FanOutConfig {
        tasks: 64,
        max_delay_ms: 5,
        ..FanOutConfig::default()
    };

    let report = timeout(Duration::from_secs(5), fan_out::run(&config, owner.token()))
        .await
        .expect("fan-out timed out")
        .unwrap();

    assert_eq!(report.tasks, 64);
    assert!(report.callback_fired);
}

#[tokio::test]
async fn test_fan_out_with_dead_owner_skips_listener() {
    let delays = vec![Duration::from_millis(1); 4];

    let report = run_with_delays(delays, LivenessToken::dead())
        .await
        .unwrap();

    assert_eq!(report.tasks, 4);
    assert!(!report.callback_fired);
}

#[tokio::test]
async fn test_owner_shutdown_mid_run_skips_listener() {
    let owner = OwnerLiveness::new();
    let token = owner.token();
    let delays = vec![Duration::ZERO, Duration::from_millis(100)];

    let run = tokio::spawn(run_with_delays(delays, token));
    tokio::time::sleep(Duration::from_millis(20)).await;
    owner.shut_down();

    let report = timeout(Duration::from_secs(2), run)
        .await
        .expect("fan-out timed out")
        .unwrap()
        .unwrap();

    assert!(!report.callback_fired);
}

#[tokio::test]
async fn test_single_task_fan_out() {
    let owner = OwnerLiveness::new();
    let report = run_with_delays(vec![Duration::ZERO], owner.token())
        .await
        .unwrap();
    assert_eq!(report.tasks, 1);
    assert!(report.callback_fired);
}
