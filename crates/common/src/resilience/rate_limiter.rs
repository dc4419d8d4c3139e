//! Shared rate-limit state fed by server signals
//!
//! Unlike a token bucket, this tracker does not decide a budget on its own. It
//! records the single instant (`reset_at`) before which the remote service has
//! asked us not to call again, and every request attempt consults it. Once set,
//! the block applies to *all* new requests until it elapses or is reset.
//!
//! Signals understood (header values are passed in as plain strings so this
//! module stays independent of any HTTP client):
//! - `Retry-After`: delta seconds or an HTTP date; always wins when present
//! - `X-RateLimit-Reset`: Unix epoch seconds (values above 10^9) or seconds
//!   from now; honoured only when `X-RateLimit-Remaining` is absent or `0`

use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{Clock, SystemClock};

/// Values above this are treated as absolute Unix timestamps.
const EPOCH_THRESHOLD_SECS: u64 = 1_000_000_000;

/// Longest block a single signal may impose.
const MAX_BLOCK: Duration = Duration::from_secs(24 * 60 * 60);

/// Raw rate-limit header values from one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitSignals {
    pub retry_after: Option<String>,
    pub remaining: Option<String>,
    pub reset: Option<String>,
}

impl RateLimitSignals {
    /// Whether the response carried any rate-limit header at all
    pub fn is_empty(&self) -> bool {
        self.retry_after.is_none() && self.remaining.is_none() && self.reset.is_none()
    }
}

/// Process-lifetime record of when requests are permitted again
pub struct RateLimitTracker<C: Clock = SystemClock> {
    reset_at: RwLock<Option<Instant>>,
    clock: C,
}

impl RateLimitTracker<SystemClock> {
    /// Create an unrestricted tracker backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RateLimitTracker<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateLimitTracker<C> {
    /// Create an unrestricted tracker with a custom clock
    pub fn with_clock(clock: C) -> Self {
        Self { reset_at: RwLock::new(None), clock }
    }

    /// Time left before requests are permitted again, if currently blocked
    pub fn remaining_wait(&self) -> Option<Duration> {
        let reset_at = (*self.reset_at.read())?;
        let now = self.clock.now();
        if reset_at > now {
            Some(reset_at - now)
        } else {
            None
        }
    }

    /// Whether new requests are currently blocked
    pub fn is_limited(&self) -> bool {
        self.remaining_wait().is_some()
    }

    /// Block all requests for the given duration from now
    pub fn block_for(&self, duration: Duration) {
        let duration = duration.min(MAX_BLOCK);
        let until = self.clock.now() + duration;
        *self.reset_at.write() = Some(until);
        warn!(wait_secs = duration.as_secs(), "rate limit engaged");
    }

    /// Update state from one response's headers
    ///
    /// Returns the block duration that was applied, if any.
    pub fn observe(&self, signals: &RateLimitSignals) -> Option<Duration> {
        let wait = self.wait_from_signals(signals)?;
        self.block_for(wait);
        Some(wait)
    }

    /// Clear any active block (test isolation and manual override)
    pub fn reset(&self) {
        *self.reset_at.write() = None;
        debug!("rate limit state reset");
    }

    fn wait_from_signals(&self, signals: &RateLimitSignals) -> Option<Duration> {
        if let Some(value) = signals.retry_after.as_deref() {
            match parse_retry_after(value, self.clock.system_time()) {
                Some(wait) => return Some(wait),
                None => warn!(value, "could not parse Retry-After header"),
            }
        }

        let exhausted = match signals.remaining.as_deref() {
            None => true,
            Some(remaining) => remaining.trim().parse::<u64>().map(|r| r == 0).unwrap_or(false),
        };
        if !exhausted {
            return None;
        }

        let reset = signals.reset.as_deref()?.trim().parse::<u64>().ok()?;
        let wait = if reset > EPOCH_THRESHOLD_SECS {
            Duration::from_secs(reset.saturating_sub(self.clock.secs_since_epoch()))
        } else {
            Duration::from_secs(reset)
        };
        (!wait.is_zero()).then_some(wait)
    }
}

/// Parse a `Retry-After` value: delta seconds or an HTTP date.
///
/// Dates in the past resolve to a zero wait. Unparseable values yield `None`.
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let target = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let now: DateTime<Utc> = now.into();
    Some((target - now).to_std().unwrap_or(Duration::ZERO))
}

/// Round a wait up to whole seconds (what error payloads report)
pub fn ceil_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
