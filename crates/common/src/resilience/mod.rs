//! Resilience building blocks for calls to rate-limited services
//!
//! - [`Clock`]: time source shared by every time-based decision
//! - [`RetryConfig`]: backoff with jitter for transient failures
//! - [`RateLimitTracker`]: server-signalled block shared by all requests
//! - [`ConcurrencyScheduler`]: bounded FIFO execution of in-flight calls
//!
//! The retry policy and the clock only need the `foundation` tier; the
//! tracker and the scheduler are async-aware and live behind `runtime`.

mod clock;
pub mod retry;

#[cfg(feature = "runtime")]
pub mod rate_limiter;
#[cfg(feature = "runtime")]
pub mod scheduler;

pub use clock::{Clock, MockClock, SystemClock};
#[cfg(feature = "runtime")]
pub use rate_limiter::{ceil_secs, parse_retry_after, RateLimitSignals, RateLimitTracker};
pub use retry::{Jitter, RetryConfig, RetryConfigBuilder};
#[cfg(feature = "runtime")]
pub use scheduler::{ConcurrencyScheduler, SchedulerConfig, SchedulerMetrics};
