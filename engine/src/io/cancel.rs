//! Cooperative cancellation token shared by a supervisor and its worker.
//!
//! The worker observes cancellation only at safe points: console writes and
//! reads, [`CancelToken::sleep`] and [`CancelToken::check`]. An operation stuck
//! outside those points never sees the request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::EngineError;

#[derive(Debug, Default)]
struct CancelState {
    requested: Mutex<bool>,
    wake: Condvar,
    observed: AtomicBool,
}

/// Cloneable handle to one run's cancellation state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake any interruptible sleep.
    ///
    /// Returns `true` when this call delivered the request, `false` when it
    /// had already been requested.
    pub fn cancel(&self) -> bool {
        let mut requested = self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let delivered = !*requested;
        *requested = true;
        self.inner.wake.notify_all();
        delivered
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the worker has reached a safe point since cancellation was requested.
    pub fn was_observed(&self) -> bool {
        self.inner.observed.load(Ordering::SeqCst)
    }

    /// Safe point: fail with [`EngineError::Cancelled`] once cancellation is requested.
    pub fn check(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            self.inner.observed.store(true, Ordering::SeqCst);
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }

    /// Sleep for `duration`, returning early with [`EngineError::Cancelled`]
    /// if cancellation is requested meanwhile.
    pub fn sleep(&self, duration: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + duration;
        let mut requested = self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !*requested {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            let (guard, _) = self
                .inner
                .wake
                .wait_timeout(requested, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            requested = guard;
        }
        self.inner.observed.store(true, Ordering::SeqCst);
        Err(EngineError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn cancel_reports_first_delivery_only() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
        assert!(!token.was_observed());
        assert!(matches!(token.check(), Err(EngineError::Cancelled)));
        assert!(token.was_observed());
    }

    #[test]
    fn sleep_completes_without_cancellation() {
        let token = CancelToken::new();
        let start = Instant::now();
        token.sleep(Duration::from_millis(20)).expect("sleep");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn cancel_interrupts_sleep() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let handle = thread::spawn(move || sleeper.sleep(Duration::from_secs(30)));
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        let result = handle.join().expect("join sleeper");
        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert!(token.was_observed());
    }
}
