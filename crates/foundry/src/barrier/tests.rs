//! Unit tests for the fan-in barrier.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use rstest::rstest;

use super::*;

/// Counts continuation firings and remembers the failures received.
#[derive(Default)]
struct Recorder {
    successes: AtomicUsize,
    failures: Mutex<Vec<String>>,
}

impl Recorder {
    fn barrier(self: &Arc<Self>, expected: usize) -> FanInBarrier<String> {
        let on_success = Arc::clone(self);
        let on_failure = Arc::clone(self);
        FanInBarrier::new(
            expected,
            move || {
                on_success.successes.fetch_add(1, Ordering::SeqCst);
            },
            move |error| {
                on_failure
                    .failures
                    .lock()
                    .expect("failures lock")
                    .push(error);
            },
        )
    }

    fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    fn failures(&self) -> Vec<String> {
        self.failures.lock().expect("failures lock").clone()
    }
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(5)]
#[case(32)]
fn success_fires_once_after_exactly_n_decrements(#[case] expected: usize) {
    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(expected);

    for _ in 0..expected {
        assert_eq!(recorder.successes(), 0, "fired before the last decrement");
        barrier.decrement();
    }

    assert_eq!(recorder.successes(), 1);
    assert!(barrier.is_fired());
    assert_eq!(barrier.remaining(), 0);
    assert!(recorder.failures().is_empty());
}

#[test]
fn zero_expected_fires_during_construction() {
    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(0);
    assert_eq!(recorder.successes(), 1);
    assert!(barrier.is_fired());
}

#[test]
fn surplus_decrements_are_ignored() {
    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(2);

    for _ in 0..5 {
        barrier.decrement();
    }

    assert_eq!(recorder.successes(), 1);
    assert_eq!(barrier.remaining(), 0);
}

#[test]
fn failure_permanently_suppresses_success() {
    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(3);

    barrier.decrement();
    barrier.fail(String::from("web page build failed"));
    barrier.decrement();
    barrier.decrement();
    barrier.decrement();

    assert_eq!(recorder.successes(), 0);
    assert_eq!(recorder.failures(), ["web page build failed"]);
}

#[test]
fn only_first_failure_is_reported() {
    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(3);

    barrier.fail(String::from("first"));
    barrier.fail(String::from("second"));

    assert_eq!(recorder.failures(), ["first"]);
}

#[test]
fn failure_after_success_is_a_no_op() {
    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(1);

    barrier.decrement();
    barrier.fail(String::from("late"));

    assert_eq!(recorder.successes(), 1);
    assert!(recorder.failures().is_empty());
}

#[test]
fn clones_share_one_counter() {
    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(2);
    let other = barrier.clone();

    barrier.decrement();
    other.decrement();

    assert_eq!(recorder.successes(), 1);
}

#[test]
fn concurrent_decrements_fire_exactly_once() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;

    let recorder = Arc::new(Recorder::default());
    let barrier = recorder.barrier(THREADS * PER_THREAD);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let handle = barrier.clone();
            scope.spawn(move || {
                for _ in 0..PER_THREAD {
                    handle.decrement();
                }
            });
        }
    });

    assert_eq!(recorder.successes(), 1);
    assert!(recorder.failures().is_empty());
}

#[test]
fn racing_failures_and_decrements_fire_one_terminal_event() {
    const THREADS: usize = 8;

    for _ in 0..50 {
        let recorder = Arc::new(Recorder::default());
        let barrier = recorder.barrier(THREADS);

        thread::scope(|scope| {
            for index in 0..THREADS {
                let handle = barrier.clone();
                scope.spawn(move || {
                    if index % 3 == 0 {
                        handle.fail(format!("failure {index}"));
                    }
                    handle.decrement();
                });
            }
        });

        let terminal_events = recorder.successes() + recorder.failures().len();
        assert_eq!(terminal_events, 1);
        assert_eq!(recorder.successes(), 0, "a failure was always reported");
    }
}

#[tokio::test]
async fn signal_resolves_on_convergence() {
    let (barrier, signal) = FanInBarrier::<String>::with_signal(2);
    let first = barrier.clone();
    tokio::spawn(async move { first.decrement() });
    tokio::spawn(async move { barrier.decrement() });

    assert_eq!(signal.wait().await, Outcome::Converged);
}

#[tokio::test]
async fn signal_resolves_with_first_failure() {
    let (barrier, signal) = FanInBarrier::with_signal(3);
    barrier.decrement();
    barrier.fail(String::from("pack failed"));
    barrier.fail(String::from("image failed"));

    assert_eq!(
        signal.wait().await,
        Outcome::Failed(String::from("pack failed"))
    );
}

#[tokio::test]
async fn signal_with_zero_expected_is_already_converged() {
    let (_barrier, signal) = FanInBarrier::<String>::with_signal(0);
    assert_eq!(signal.wait().await, Outcome::Converged);
}

#[tokio::test]
async fn signal_reports_abandonment_when_all_handles_drop() {
    let (barrier, signal) = FanInBarrier::<String>::with_signal(2);
    barrier.decrement();
    drop(barrier);

    assert_eq!(signal.wait().await, Outcome::Abandoned);
}
