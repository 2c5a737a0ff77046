//! Sliding-window rate limiting.
//!
//! A [`RateWindow`] admits at most `calls` per rolling `period`. Callables are
//! wrapped with one of two policies:
//!
//! - [`with_retry_limit`]: excess calls sleep until a slot frees, then run
//! - [`with_fail_fast_limit`]: excess calls fail with
//!   [`RateLimitExceeded`](crate::errors::RateLimitExceeded)
//!
//! Each wrapper owns its window; limits are per process and never shared
//! across wrapped operations.

mod limited;
mod window;

pub use limited::{with_fail_fast_limit, with_retry_limit, FailFastLimited, RetryLimited};
pub use window::{Clock, Quota, RateWindow, SystemClock};

/// Default calls admitted per period for external service calls.
pub const DEFAULT_CALLS: u32 = 10;

/// Default window length in seconds.
pub const DEFAULT_PERIOD_SECS: u64 = 60;
