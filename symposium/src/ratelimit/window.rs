//! Sliding-window call accounting.

use crate::errors::ConfigError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Source of monotonic time for rate windows.
///
/// Waiting goes through the same clock that admission reads, so a window
/// never sleeps on one timeline while measuring another.
#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Waits until `duration` has passed on this clock.
    async fn sleep(&self, duration: Duration);
}

/// The tokio runtime clock.
///
/// Follows the runtime's timer, including paused and advanced time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Maximum calls admitted per rolling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    calls: u32,
    period: Duration,
}

impl Quota {
    /// Creates a quota of `calls` per `period`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidQuota` if `calls` is zero or `period` is zero.
    pub fn new(calls: u32, period: Duration) -> Result<Self, ConfigError> {
        if calls == 0 {
            return Err(ConfigError::InvalidQuota(
                "calls per period must be at least 1".to_string(),
            ));
        }
        if period.is_zero() {
            return Err(ConfigError::InvalidQuota(
                "period must be longer than zero".to_string(),
            ));
        }
        Ok(Self { calls, period })
    }

    /// Returns the maximum calls per period.
    #[must_use]
    pub const fn calls(&self) -> u32 {
        self.calls
    }

    /// Returns the window length.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

/// Sliding record of admitted calls for one protected operation.
///
/// A call admitted at `t` counts against the quota until `t + period`.
/// Expired entries are pruned lazily on each admission check, and the
/// check-and-record step runs under a single lock.
#[derive(Debug)]
pub struct RateWindow {
    quota: Quota,
    clock: Arc<dyn Clock>,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateWindow {
    /// Creates a window on the system clock.
    #[must_use]
    pub fn new(quota: Quota) -> Self {
        Self::with_clock(quota, Arc::new(SystemClock))
    }

    /// Creates a window on a custom clock.
    #[must_use]
    pub fn with_clock(quota: Quota, clock: Arc<dyn Clock>) -> Self {
        Self {
            quota,
            clock,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns the quota.
    #[must_use]
    pub const fn quota(&self) -> Quota {
        self.quota
    }

    /// Admits and records a call if a slot is free.
    ///
    /// # Errors
    ///
    /// Returns the time until the oldest recorded call leaves the window.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut calls = self.calls.lock();
        Self::prune(&mut calls, now, self.quota.period);

        if calls.len() < self.quota.calls as usize {
            calls.push_back(now);
            return Ok(());
        }

        let oldest = calls.front().copied().unwrap_or(now);
        Err((oldest + self.quota.period).saturating_duration_since(now))
    }

    /// Waits until a slot is free, then records the call.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    debug!(
                        calls = self.quota.calls,
                        period_secs = self.quota.period.as_secs_f64(),
                        wait_secs = wait.as_secs_f64(),
                        "Rate limit reached, sleeping until a slot frees"
                    );
                    self.clock.sleep(wait).await;
                }
            }
        }
    }

    /// Returns the number of calls currently inside the window.
    #[must_use]
    pub fn in_window(&self) -> usize {
        let now = self.clock.now();
        let mut calls = self.calls.lock();
        Self::prune(&mut calls, now, self.quota.period);
        calls.len()
    }

    fn prune(calls: &mut VecDeque<Instant>, now: Instant, period: Duration) {
        while let Some(&oldest) = calls.front() {
            if now.saturating_duration_since(oldest) >= period {
                calls.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;

    fn window(calls: u32, period_secs: u64) -> (RateWindow, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let quota = Quota::new(calls, Duration::from_secs(period_secs)).unwrap();
        (RateWindow::with_clock(quota, clock.clone()), clock)
    }

    #[test]
    fn test_quota_rejects_zero() {
        assert!(Quota::new(0, Duration::from_secs(1)).is_err());
        assert!(Quota::new(1, Duration::ZERO).is_err());
        assert!(Quota::new(1, Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn test_admits_up_to_quota() {
        let (window, _clock) = window(3, 60);

        for _ in 0..3 {
            assert!(window.try_acquire().is_ok());
        }
        assert!(window.try_acquire().is_err());
        assert_eq!(window.in_window(), 3);
    }

    #[test]
    fn test_wait_is_time_until_oldest_expires() {
        let (window, clock) = window(2, 60);

        window.try_acquire().unwrap();
        clock.advance(Duration::from_secs(10));
        window.try_acquire().unwrap();
        clock.advance(Duration::from_secs(5));

        assert_eq!(window.try_acquire(), Err(Duration::from_secs(45)));
    }

    #[test]
    fn test_entries_expire_at_period_boundary() {
        let (window, clock) = window(1, 60);

        window.try_acquire().unwrap();
        clock.advance(Duration::from_secs(59));
        assert!(window.try_acquire().is_err());

        clock.advance(Duration::from_secs(1));
        assert!(window.try_acquire().is_ok());
        assert_eq!(window.in_window(), 1);
    }

    #[test]
    fn test_pruned_entries_never_outlive_period() {
        let (window, clock) = window(5, 10);

        for _ in 0..5 {
            window.try_acquire().unwrap();
            clock.advance(Duration::from_secs(3));
        }
        // Calls at t=0 and t=3 are outside the window at t=15.
        assert_eq!(window.in_window(), 3);
    }

    #[tokio::test]
    async fn test_acquire_sleeps_until_slot_frees() {
        let quota = Quota::new(1, Duration::from_millis(100)).unwrap();
        let window = RateWindow::new(quota);

        window.acquire().await;
        let start = Instant::now();
        window.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_acquire_waits_on_the_window_clock() {
        let (window, clock) = window(1, 30);
        let start = clock.now();

        window.acquire().await;
        tokio::time::timeout(Duration::from_millis(500), window.acquire())
            .await
            .expect("acquire should return once the manual clock has moved");

        assert!(clock.now() - start >= Duration::from_secs(30));
        assert_eq!(window.in_window(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_follows_paused_runtime() {
        let quota = Quota::new(1, Duration::from_secs(3600)).unwrap();
        let window = RateWindow::new(quota);
        let start = tokio::time::Instant::now();

        window.acquire().await;
        tokio::time::timeout(Duration::from_secs(7200), window.acquire())
            .await
            .expect("acquire should return after one period of runtime time");

        assert!(start.elapsed() >= Duration::from_secs(3600));
    }
}
