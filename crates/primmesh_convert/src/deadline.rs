//! Time limits for pending conversions.
//!
//! A [`Deferred`] has no cancellation of its own. [`reject_after`] races a
//! timer against it; whichever settles the deferred first wins and the
//! other side becomes a no-op.
//!
//! ```text
//! reject_after ──► timer thread ── select! ─┬─ cancel / guard dropped ──► exit
//!                                           └─ after(timeout) ──────────► reject
//! ```

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{after, bounded, select, Sender};
use primmesh_core::Deferred;
use tracing::debug;

/// Guard for a running deadline timer.
///
/// Dropping the guard cancels the timer without waiting for its thread.
/// Cancel as soon as the guarded deferred settles so the timer thread exits
/// early instead of sleeping out the full timeout.
#[must_use = "dropping the guard cancels the deadline"]
#[derive(Debug)]
pub struct Deadline {
    cancel: Option<Sender<()>>,
    timer: Option<JoinHandle<()>>,
}

impl Deadline {
    /// Stops the timer and waits for its thread to exit.
    ///
    /// Has no effect on the deferred if the timer already fired.
    pub fn cancel(mut self) {
        drop(self.cancel.take());
        self.join_timer();
    }

    /// Waits for the timer to fire or observe cancellation.
    pub fn wait(mut self) {
        self.join_timer();
    }

    fn join_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        drop(self.cancel.take());
    }
}

/// Rejects `deferred` with `error` once `timeout` has elapsed, unless the
/// returned [`Deadline`] is cancelled first.
///
/// # Errors
///
/// Fails if the timer thread cannot be spawned.
pub fn reject_after<T, E>(
    deferred: &Deferred<T, E>,
    timeout: Duration,
    error: E,
) -> io::Result<Deadline>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let deferred = deferred.clone();
    let (cancel, cancelled) = bounded::<()>(0);
    let timer = thread::Builder::new()
        .name("primmesh-deadline".into())
        .spawn(move || {
            select! {
                recv(cancelled) -> _ => {}
                recv(after(timeout)) -> _ => {
                    if !deferred.is_settled() {
                        debug!(?timeout, "deadline expired, rejecting");
                    }
                    deferred.reject(error);
                }
            }
        })?;

    Ok(Deadline {
        cancel: Some(cancel),
        timer: Some(timer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_rejects_pending_deferred() {
        let deferred: Deferred<u32, &'static str> = Deferred::new();
        reject_after(&deferred, Duration::from_millis(10), "timed out")
            .unwrap()
            .wait();
        assert_eq!(
            deferred.wait_timeout(Duration::from_secs(1)),
            Some(Err("timed out"))
        );
    }

    #[test]
    fn test_settled_deferred_is_untouched() {
        let deferred: Deferred<u32, &'static str> = Deferred::new();
        let deadline = reject_after(&deferred, Duration::from_millis(10), "timed out").unwrap();
        deferred.resolve(5);
        deadline.wait();
        assert_eq!(deferred.wait_timeout(Duration::from_secs(1)), Some(Ok(5)));
    }

    #[test]
    fn test_cancel_releases_timer_thread() {
        let deferred: Deferred<u32, &'static str> = Deferred::new();
        let deadline = reject_after(&deferred, Duration::from_secs(60), "timed out").unwrap();

        let started = Instant::now();
        deadline.cancel();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!deferred.is_settled());
    }

    #[test]
    fn test_dropped_guard_never_rejects() {
        let deferred: Deferred<u32, &'static str> = Deferred::new();
        drop(reject_after(&deferred, Duration::from_millis(10), "timed out").unwrap());
        assert_eq!(deferred.wait_timeout(Duration::from_millis(100)), None);
    }
}
