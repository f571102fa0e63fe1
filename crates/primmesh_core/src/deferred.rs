//! # Deferred Results
//!
//! Single-assignment, single-fire result cell used to sequence asset fetches
//! and mesh construction without parking a thread on the outcome.
//!
//! ## State Machine
//!
//! ```text
//!   success channel            failure channel
//!   ┌──────────────────┐       ┌──────────────────┐
//!   │ NoValueOrCallback│       │ NoValueOrCallback│
//!   └───┬──────────┬───┘       └───┬──────────┬───┘
//!  then │          │ resolve  rejected│       │ reject
//!       ▼          ▼                  ▼       ▼
//!  HaveCallback  HaveValue      HaveCallback HaveValue
//!       │          │                  │       │
//!       └────┬─────┘                  └───┬───┘
//!            ▼                            ▼
//!         Complete                     Complete
//! ```
//!
//! The first of `resolve` / `reject` settles the cell. The losing channel is
//! moved straight to `Complete`, so its callback (if any) is dropped unfired.
//! Every later terminal call is a silent no-op.
//!
//! Callbacks never run while the internal lock is held, so a callback may
//! freely settle or register on other deferreds (or on this one).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;

type Callback<V> = Box<dyn FnOnce(V) + Send + 'static>;

/// Per-channel resolution state.
enum Channel<V> {
    /// Neither a value nor a callback has arrived.
    NoValueOrCallback,
    /// A callback is waiting for the value.
    HaveCallback(Callback<V>),
    /// The value is waiting for a callback.
    HaveValue(V),
    /// The callback fired, or the channel lost the race to settle.
    Complete,
}

impl<V> Channel<V> {
    /// Delivers a value. Returns the callback to fire, if one was waiting.
    fn deliver(&mut self, value: V) -> Option<(Callback<V>, V)> {
        match std::mem::replace(self, Channel::Complete) {
            Channel::NoValueOrCallback => {
                *self = Channel::HaveValue(value);
                None
            }
            Channel::HaveCallback(callback) => Some((callback, value)),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Registers a callback. Returns it with the value if the value is
    /// already here; otherwise parks it. A second registration is dropped.
    fn register(&mut self, callback: Callback<V>) -> Option<(Callback<V>, V)> {
        match std::mem::replace(self, Channel::Complete) {
            Channel::NoValueOrCallback => {
                *self = Channel::HaveCallback(callback);
                None
            }
            Channel::HaveValue(value) => Some((callback, value)),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Closes the channel, handing back anything that was parked in it.
    fn close(&mut self) -> Channel<V> {
        std::mem::replace(self, Channel::Complete)
    }

    fn name(&self) -> &'static str {
        match self {
            Channel::NoValueOrCallback => "NoValueOrCallback",
            Channel::HaveCallback(_) => "HaveCallback",
            Channel::HaveValue(_) => "HaveValue",
            Channel::Complete => "Complete",
        }
    }
}

struct Inner<T, E> {
    success: Channel<T>,
    failure: Channel<E>,
    settled: bool,
}

/// A single-fire deferred result.
///
/// Cloning yields another handle to the same cell; the producer keeps one
/// handle to settle it and the consumer registers callbacks through another.
///
/// ## Usage
///
/// ```rust
/// use primmesh_core::Deferred;
///
/// let mesh_count: Deferred<usize, String> = Deferred::new();
/// mesh_count
///     .then(|count| assert_eq!(count, 3))
///     .rejected(|err| panic!("unexpected failure: {err}"));
///
/// mesh_count.resolve(3);
/// mesh_count.resolve(4); // ignored
/// ```
pub struct Deferred<T, E> {
    inner: Arc<Mutex<Inner<T, E>>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for Deferred<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Deferred<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates an empty deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                success: Channel::NoValueOrCallback,
                failure: Channel::NoValueOrCallback,
                settled: false,
            })),
        }
    }

    /// Creates a deferred that is already resolved.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        let deferred = Self::new();
        deferred.resolve(value);
        deferred
    }

    /// Creates a deferred that is already rejected.
    #[must_use]
    pub fn failed(error: E) -> Self {
        let deferred = Self::new();
        deferred.reject(error);
        deferred
    }

    /// Settles the deferred with a value.
    ///
    /// No-op if the deferred was already resolved or rejected.
    pub fn resolve(&self, value: T) {
        let (fire, discarded) = {
            let mut inner = self.inner.lock();
            if inner.settled {
                return;
            }
            inner.settled = true;
            let fire = inner.success.deliver(value);
            (fire, inner.failure.close())
        };
        drop(discarded);
        if let Some((callback, value)) = fire {
            callback(value);
        }
    }

    /// Settles the deferred with an error.
    ///
    /// No-op if the deferred was already resolved or rejected.
    pub fn reject(&self, error: E) {
        let (fire, discarded) = {
            let mut inner = self.inner.lock();
            if inner.settled {
                return;
            }
            inner.settled = true;
            let fire = inner.failure.deliver(error);
            (fire, inner.success.close())
        };
        drop(discarded);
        if let Some((callback, error)) = fire {
            callback(error);
        }
    }

    /// Registers the success callback.
    ///
    /// Fires immediately (on this thread) if the value is already held.
    /// Only the first registration counts.
    pub fn then<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        let fire = self.inner.lock().success.register(Box::new(callback));
        if let Some((callback, value)) = fire {
            callback(value);
        }
        self
    }

    /// Registers the failure callback.
    ///
    /// Fires immediately (on this thread) if the error is already held.
    /// Only the first registration counts.
    pub fn rejected<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(E) + Send + 'static,
    {
        let fire = self.inner.lock().failure.register(Box::new(callback));
        if let Some((callback, error)) = fire {
            callback(error);
        }
        self
    }

    /// Returns true once `resolve` or `reject` has been called.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.lock().settled
    }

    /// Bridges this deferred onto a channel for callers that want to block.
    ///
    /// Consumes both registration slots. If either slot was already taken,
    /// the receiver may report a disconnect instead of a result.
    #[must_use]
    pub fn into_receiver(self) -> Receiver<Result<T, E>> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let tx_err = tx.clone();
        self.then(move |value| {
            let _ = tx.send(Ok(value));
        })
        .rejected(move |error| {
            let _ = tx_err.send(Err(error));
        });
        rx
    }

    /// Blocks the calling thread until the deferred settles or `timeout`
    /// elapses. Returns `None` on timeout or if the result can no longer
    /// arrive.
    ///
    /// Never call this from inside a pipeline callback.
    #[must_use]
    pub fn wait_timeout(self, timeout: Duration) -> Option<Result<T, E>> {
        match self.into_receiver().recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Deferred")
            .field("settled", &inner.settled)
            .field("success", &inner.success.name())
            .field("failure", &inner.failure.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<Mutex<Vec<u32>>>) {
        (Arc::new(AtomicUsize::new(0)), Arc::new(Mutex::new(Vec::new())))
    }

    #[test]
    fn test_register_then_resolve() {
        let (calls, seen) = counter();
        let deferred: Deferred<u32, String> = Deferred::new();

        let (c, s) = (Arc::clone(&calls), Arc::clone(&seen));
        deferred.then(move |v| {
            c.fetch_add(1, Ordering::SeqCst);
            s.lock().push(v);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        deferred.resolve(7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn test_resolve_then_register() {
        let (calls, seen) = counter();
        let deferred: Deferred<u32, String> = Deferred::new();
        deferred.resolve(11);

        let (c, s) = (Arc::clone(&calls), Arc::clone(&seen));
        deferred.then(move |v| {
            c.fetch_add(1, Ordering::SeqCst);
            s.lock().push(v);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), vec![11]);
    }

    #[test]
    fn test_second_terminal_call_is_noop() {
        let (calls, seen) = counter();
        let failures = Arc::new(AtomicUsize::new(0));
        let deferred: Deferred<u32, String> = Deferred::new();

        let (c, s) = (Arc::clone(&calls), Arc::clone(&seen));
        let f = Arc::clone(&failures);
        deferred
            .then(move |v| {
                c.fetch_add(1, Ordering::SeqCst);
                s.lock().push(v);
            })
            .rejected(move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            });

        deferred.resolve(1);
        deferred.resolve(2);
        deferred.reject("late".to_string());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failures.load(Ordering::SeqCst), 0);
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_reject_wins_over_later_resolve() {
        let failures = Arc::new(Mutex::new(Vec::new()));
        let successes = Arc::new(AtomicUsize::new(0));
        let deferred: Deferred<u32, String> = Deferred::new();

        deferred.reject("boom".to_string());
        deferred.resolve(5);

        let s = Arc::clone(&successes);
        let f = Arc::clone(&failures);
        deferred
            .then(move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .rejected(move |e| f.lock().push(e));

        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(*failures.lock(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_second_registration_is_ignored() {
        let (calls, _) = counter();
        let deferred: Deferred<u32, String> = Deferred::new();

        let c1 = Arc::clone(&calls);
        let c2 = Arc::clone(&calls);
        deferred.then(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        deferred.then(move |_| {
            c2.fetch_add(100, Ordering::SeqCst);
        });
        deferred.resolve(0);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_may_touch_same_deferred() {
        let deferred: Deferred<u32, String> = Deferred::new();
        let again = deferred.clone();
        deferred.then(move |_| {
            // Re-entrant terminal call must not deadlock.
            again.resolve(99);
            assert!(again.is_settled());
        });
        deferred.resolve(1);
    }

    #[test]
    fn test_resolve_across_threads() {
        let deferred: Deferred<u32, String> = Deferred::new();
        let producer = deferred.clone();
        let handle = std::thread::spawn(move || producer.resolve(42));
        let result = deferred.wait_timeout(Duration::from_secs(5));
        handle.join().unwrap();
        assert_eq!(result, Some(Ok(42)));
    }

    #[test]
    fn test_wait_timeout_expires() {
        let deferred: Deferred<u32, String> = Deferred::new();
        let keep = deferred.clone();
        assert_eq!(deferred.wait_timeout(Duration::from_millis(10)), None);
        assert!(!keep.is_settled());
    }

    #[test]
    fn test_prebuilt_constructors() {
        assert_eq!(
            Deferred::<u32, String>::resolved(3).wait_timeout(Duration::from_millis(10)),
            Some(Ok(3))
        );
        assert_eq!(
            Deferred::<u32, String>::failed("x".into()).wait_timeout(Duration::from_millis(10)),
            Some(Err("x".to_string()))
        );
    }
}
