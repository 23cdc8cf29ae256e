//! Cross-thread behaviour of `CompletionTracker` under a multi-threaded runtime.

use fanin_common::{CompletionPhase, CompletionTracker};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_tasks_fire_listener_exactly_once() {
    for _ in 0..25 {
        let tracker = Arc::new(CompletionTracker::new(32));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        tracker.set_on_complete_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let handles: Vec<_> = (0..32)
            .map(|position| {
                let tracker = tracker.clone();
                tokio::spawn(async move { tracker.set(position) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(tracker.is_complete());
        assert_eq!(tracker.phase(), CompletionPhase::Complete);
    }
}

#[tokio::test]
async fn test_waiter_released_by_marks_from_std_threads() {
    let tracker = Arc::new(CompletionTracker::new(4));

    let handles: Vec<_> = (0..4)
        .map(|position| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                tracker.set(position).unwrap();
            })
        })
        .collect();

    let result = timeout(Duration::from_secs(2), tracker.wait_complete()).await;
    assert!(result.is_ok());

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(tracker.pending_positions().is_empty());
}

#[test]
fn test_readers_see_monotonic_progress() {
    let tracker = Arc::new(CompletionTracker::new(200));

    let reader = {
        let tracker = tracker.clone();
        thread::spawn(move || {
            let mut last = 0;
            while !tracker.is_complete() {
                let now = tracker.marked_count();
                assert!(now >= last, "marked count went backwards");
                last = now;
            }
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|lane| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for position in (lane..200).step_by(4) {
                    tracker.set(position).unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();
    assert_eq!(tracker.marked_count(), 200);
}
