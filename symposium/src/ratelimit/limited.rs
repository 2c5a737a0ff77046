//! Rate-limited wrappers around callables.
//!
//! Each wrapper owns its own [`RateWindow`], so two wrapped operations never
//! share a quota even when they reach the same backend.

use super::window::{Clock, Quota, RateWindow};
use crate::errors::RateLimitExceeded;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Wraps `func` so that excess calls sleep until a slot frees.
pub fn with_retry_limit<F>(quota: Quota, func: F) -> RetryLimited<F> {
    RetryLimited {
        func,
        window: RateWindow::new(quota),
    }
}

/// Wraps `func` so that excess calls fail with [`RateLimitExceeded`].
pub fn with_fail_fast_limit<F>(quota: Quota, func: F) -> FailFastLimited<F> {
    FailFastLimited {
        func,
        window: RateWindow::new(quota),
    }
}

/// A callable whose excess calls wait for a free slot.
///
/// The wait is invisible to the caller: `call` always returns whatever the
/// wrapped function returns.
#[derive(Debug)]
pub struct RetryLimited<F> {
    func: F,
    window: RateWindow,
}

impl<F> RetryLimited<F> {
    /// Wraps `func` using a custom clock.
    #[must_use]
    pub fn with_clock(quota: Quota, clock: Arc<dyn Clock>, func: F) -> Self {
        Self {
            func,
            window: RateWindow::with_clock(quota, clock),
        }
    }

    /// Returns the window guarding this callable.
    #[must_use]
    pub const fn window(&self) -> &RateWindow {
        &self.window
    }

    /// Invokes the wrapped function once a slot is available.
    pub async fn call<A, Fut>(&self, arg: A) -> Fut::Output
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        self.window.acquire().await;
        let quota = self.window.quota();
        debug!(
            calls = quota.calls(),
            period_secs = quota.period().as_secs_f64(),
            "Rate-limited call"
        );
        (self.func)(arg).await
    }
}

/// A callable whose excess calls are refused.
#[derive(Debug)]
pub struct FailFastLimited<F> {
    func: F,
    window: RateWindow,
}

impl<F> FailFastLimited<F> {
    /// Wraps `func` using a custom clock.
    #[must_use]
    pub fn with_clock(quota: Quota, clock: Arc<dyn Clock>, func: F) -> Self {
        Self {
            func,
            window: RateWindow::with_clock(quota, clock),
        }
    }

    /// Returns the window guarding this callable.
    #[must_use]
    pub const fn window(&self) -> &RateWindow {
        &self.window
    }

    /// Invokes the wrapped function if a slot is free.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded` without invoking the function when the
    /// window is full.
    pub async fn call<A, Fut>(&self, arg: A) -> Result<Fut::Output, RateLimitExceeded>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        let quota = self.window.quota();
        if let Err(retry_after) = self.window.try_acquire() {
            debug!(
                calls = quota.calls(),
                period_secs = quota.period().as_secs_f64(),
                retry_after_secs = retry_after.as_secs_f64(),
                "Rate-limited call refused"
            );
            return Err(RateLimitExceeded {
                calls: quota.calls(),
                period: quota.period(),
                retry_after,
            });
        }

        debug!(
            calls = quota.calls(),
            period_secs = quota.period().as_secs_f64(),
            "Rate-limited call (no retry)"
        );
        Ok((self.func)(arg).await)
    }
}
