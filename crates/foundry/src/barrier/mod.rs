//! Fan-in coordination with exactly-once termination.
//!
//! A [`FanInBarrier`] is created with the number of outstanding operations.
//! Every operation reports either [`decrement`](FanInBarrier::decrement) on
//! success or [`fail`](FanInBarrier::fail) on error. The barrier fires
//! exactly one terminal continuation:
//!
//! - the success continuation, once the count reaches zero with no failure
//!   reported, or
//! - the failure continuation, on the first `fail`, which permanently
//!   disables the success path.
//!
//! Every call after the terminal firing is a no-op. The counter and the latch
//! are atomics and the latch is claimed with a compare-and-swap, so reports
//! may arrive from any task or thread in any order.
//!
//! [`FanInBarrier::with_signal`] bridges the continuations into async code:
//! the returned [`BarrierSignal`] resolves to the terminal [`Outcome`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

type SuccessContinuation = Box<dyn FnOnce() + Send>;
type FailureContinuation<E> = Box<dyn FnOnce(E) + Send>;

struct Inner<E> {
    remaining: AtomicUsize,
    fired: AtomicBool,
    continuations: Mutex<Option<(SuccessContinuation, FailureContinuation<E>)>>,
}

/// Counter-based fan-in barrier. Cloning yields another handle to the same
/// barrier.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// use foundry::FanInBarrier;
///
/// let done = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&done);
/// let barrier = FanInBarrier::<String>::new(
///     2,
///     move || flag.store(true, Ordering::SeqCst),
///     |_error| {},
/// );
///
/// barrier.decrement();
/// assert!(!done.load(Ordering::SeqCst));
/// barrier.decrement();
/// assert!(done.load(Ordering::SeqCst));
/// ```
pub struct FanInBarrier<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for FanInBarrier<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for FanInBarrier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanInBarrier")
            .field("remaining", &self.remaining())
            .field("fired", &self.is_fired())
            .finish()
    }
}

impl<E> FanInBarrier<E> {
    /// Number of decrements still required for success.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// Returns `true` once either continuation has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    fn claim(&self) -> Option<(SuccessContinuation, FailureContinuation<E>)> {
        self.inner
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.inner
            .continuations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<E: Send + 'static> FanInBarrier<E> {
    /// Creates a barrier expecting `expected` decrements.
    ///
    /// With `expected == 0` the success continuation runs before this
    /// function returns.
    #[must_use]
    pub fn new(
        expected: usize,
        on_success: impl FnOnce() + Send + 'static,
        on_failure: impl FnOnce(E) + Send + 'static,
    ) -> Self {
        let barrier = Self {
            inner: Arc::new(Inner {
                remaining: AtomicUsize::new(expected),
                fired: AtomicBool::new(false),
                continuations: Mutex::new(Some((Box::new(on_success), Box::new(on_failure)))),
            }),
        };
        if expected == 0 {
            barrier.fire_success();
        }
        barrier
    }

    /// Creates a barrier whose terminal firing resolves the returned signal.
    #[must_use]
    pub fn with_signal(expected: usize) -> (Self, BarrierSignal<E>) {
        let (sender, receiver) = oneshot::channel();
        let failure_slot = Arc::new(Mutex::new(Some(sender)));
        let success_slot = Arc::clone(&failure_slot);
        let barrier = Self::new(
            expected,
            move || resolve(&success_slot, Outcome::Converged),
            move |error| resolve(&failure_slot, Outcome::Failed(error)),
        );
        (barrier, BarrierSignal { receiver })
    }

    /// Records one successful sub-operation.
    pub fn decrement(&self) {
        if self.is_fired() {
            return;
        }
        let previous = self
            .inner
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });
        if previous == Ok(1) {
            self.fire_success();
        }
    }

    /// Records a failed sub-operation. Only the first report after creation
    /// has any effect.
    pub fn fail(&self, error: E) {
        if let Some((_, on_failure)) = self.claim() {
            on_failure(error);
        }
    }

    fn fire_success(&self) {
        if let Some((on_success, _)) = self.claim() {
            on_success();
        }
    }
}

fn resolve<E>(slot: &Mutex<Option<oneshot::Sender<Outcome<E>>>>, outcome: Outcome<E>) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(sender) = sender {
        // The waiter may have given up; the outcome is then irrelevant.
        drop(sender.send(outcome));
    }
}

/// Terminal event of a barrier.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<E> {
    /// Every expected sub-operation succeeded.
    Converged,
    /// The first reported failure.
    Failed(E),
    /// Every handle was dropped before the barrier fired.
    Abandoned,
}

/// Awaitable view of a barrier created with [`FanInBarrier::with_signal`].
#[derive(Debug)]
pub struct BarrierSignal<E> {
    receiver: oneshot::Receiver<Outcome<E>>,
}

impl<E> BarrierSignal<E> {
    /// Waits for the barrier's terminal event.
    pub async fn wait(self) -> Outcome<E> {
        self.receiver.await.unwrap_or(Outcome::Abandoned)
    }
}

#[cfg(test)]
mod tests;
