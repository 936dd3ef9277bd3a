//! Cancellable polling
//!
//! Every blocking loop in the tool sleeps on a [`CancelToken`] so an interrupt
//! wakes it immediately instead of after the current poll interval.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Shared cancellation flag that sleeping threads can wait on
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `duration`. Returns `true` if the token was cancelled.
    pub(crate) fn sleep(&self, duration: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Block until cancelled
    pub(crate) fn wait(&self) {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = cvar
            .wait_while(guard, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WaitOutcome<T> {
    Ready(T),
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PollSchedule {
    pub(crate) interval: Duration,
    /// `None` waits until ready or cancelled
    pub(crate) timeout: Option<Duration>,
}

impl PollSchedule {
    pub(crate) fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }
}

/// Run `check` every `schedule.interval` until it yields a value.
///
/// Errors from `check` end the wait and are returned as-is.
pub(crate) fn poll_until<T, E, F>(
    cancel: &CancelToken,
    schedule: PollSchedule,
    mut check: F,
) -> Result<WaitOutcome<T>, E>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    // a timeout too large to represent is no deadline at all
    let deadline = schedule
        .timeout
        .and_then(|t| Instant::now().checked_add(t));
    loop {
        if cancel.is_cancelled() {
            return Ok(WaitOutcome::Cancelled);
        }
        if let Some(value) = check()? {
            return Ok(WaitOutcome::Ready(value));
        }

        let mut pause = schedule.interval;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            pause = pause.min(deadline - now);
        }
        if cancel.sleep(pause) {
            return Ok(WaitOutcome::Cancelled);
        }
    }
}
