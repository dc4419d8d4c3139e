//! Backoff and jitter policy for retried requests
//!
//! The retry loop itself lives with the caller (the resilient fetcher drives an
//! explicit attempt counter); this module only answers two questions: "may I
//! try again after attempt N?" and "how long should I wait first?".
//!
//! The delay before the retry that follows attempt `n` (0-based) is
//! `min(initial_delay * multiplier^n, max_delay)`, then jittered.

use std::time::Duration;

use rand::Rng;

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Uniform perturbation of `±fraction` around the calculated delay,
    /// floored at zero. `Proportional(0.25)` yields `[0.75d, 1.25d]`.
    Proportional(f64),
}

impl Jitter {
    /// Apply jitter to the calculated delay using the thread-local RNG
    pub fn apply(&self, delay: Duration) -> Duration {
        self.apply_with_rng(delay, &mut rand::thread_rng())
    }

    /// Apply jitter with a caller-provided RNG (seeded RNGs make tests
    /// reproducible)
    pub fn apply_with_rng<R: Rng + ?Sized>(&self, delay: Duration, rng: &mut R) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Proportional(fraction) => {
                let fraction = fraction.abs();
                if fraction == 0.0 {
                    return delay;
                }
                let factor = 1.0 + rng.gen_range(-fraction..=fraction);
                let millis = (delay.as_millis() as f64 * factor).max(0.0);
                Duration::from_millis(millis.round() as u64)
            }
        }
    }

    /// Largest delay this jitter can produce for the given base delay
    pub fn upper_bound(&self, delay: Duration) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Proportional(fraction) => {
                let millis = delay.as_millis() as f64 * (1.0 + fraction.abs());
                Duration::from_millis(millis.ceil() as u64)
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Geometric growth factor applied per attempt
    pub multiplier: f64,
    /// Upper clamp applied before jitter
    pub max_delay: Duration,
    /// Jitter applied after clamping
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1_000),
            multiplier: 2.0,
            max_delay: Duration::from_millis(5_000),
            jitter: Jitter::Proportional(0.25),
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.multiplier <= 0.0 || !self.multiplier.is_finite() {
            return Err("backoff multiplier must be a positive number".to_string());
        }
        Ok(())
    }

    /// Whether another attempt is allowed after the given 0-based attempt
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }

    /// Clamped exponential delay before jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let delay_ms = delay.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(delay_ms as u64)
    }

    /// Jittered delay to wait before retrying after the given attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.base_delay(attempt))
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.initial_delay = initial_delay;
        self.config.multiplier = multiplier;
        self.config.max_delay = max_delay;
        self
    }

    pub fn no_jitter(mut self) -> Self {
        self.config.jitter = Jitter::None;
        self
    }

    pub fn proportional_jitter(mut self, fraction: f64) -> Self {
        self.config.jitter = Jitter::Proportional(fraction);
        self
    }

    pub fn build(self) -> Result<RetryConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
