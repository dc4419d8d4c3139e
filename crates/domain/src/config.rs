//! Configuration management
//!
//! Every field has a default, so a configuration file only needs to name the
//! values it changes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::errors::{GapfinderError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub requests: RequestConfig,
    pub batch: BatchConfig,
    pub cache: CacheSettings,
    pub availability: AvailabilityConfig,
}

/// Remote calendar service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: GOOGLE_CALENDAR_API_BASE.to_string(), page_size: EVENTS_PAGE_SIZE }
    }
}

/// Concurrency, retry and timeout settings for each remote call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub max_concurrent_requests: usize,
    pub max_retry_attempts: u32,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub request_timeout_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            initial_retry_delay_ms: DEFAULT_INITIAL_RETRY_DELAY_MS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// Batch orchestration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, inter_batch_delay_ms: DEFAULT_INTER_BATCH_DELAY_MS }
    }
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub cache_max_size: usize,
    pub cache_ttl_minutes: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            cache_ttl_minutes: DEFAULT_CACHE_TTL_MINUTES,
        }
    }
}

/// What to report for a date that yields no free slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDayPolicy {
    /// Leave the date out of the results
    #[default]
    Omit,
    /// Emit an empty row for dates the caller named in a preferred window
    ReportPreferred,
}

impl FromStr for EmptyDayPolicy {
    type Err = String;

    /// Accepts the serialized names (`omit`, `report_preferred`), ignoring
    /// case and treating `-` like `_`.
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "omit" => Ok(Self::Omit),
            "report_preferred" => Ok(Self::ReportPreferred),
            other => Err(format!("unknown empty day policy: {other}")),
        }
    }
}

/// Availability computation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    pub buffer_minutes: u32,
    pub min_slot_duration_minutes: u32,
    pub core_time_start_hour: u32,
    /// May be 24 to run the core window to midnight
    pub core_time_end_hour: u32,
    pub empty_day_policy: EmptyDayPolicy,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            min_slot_duration_minutes: DEFAULT_MIN_SLOT_DURATION_MINUTES,
            core_time_start_hour: DEFAULT_CORE_TIME_START_HOUR,
            core_time_end_hour: DEFAULT_CORE_TIME_END_HOUR,
            empty_day_policy: EmptyDayPolicy::Omit,
        }
    }
}

impl AvailabilityConfig {
    /// Validate the core-time bounds
    ///
    /// # Errors
    /// Returns `GapfinderError::Config` unless `start < end <= 24`.
    pub fn validate(&self) -> Result<()> {
        if self.core_time_end_hour > 24 || self.core_time_start_hour >= self.core_time_end_hour {
            return Err(GapfinderError::Config(format!(
                "core time {}:00-{}:00 is not a valid daily window",
                self.core_time_start_hour, self.core_time_end_hour
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Check values that deserialize fine but cannot work
    ///
    /// # Errors
    /// Returns `GapfinderError::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let requests = &self.requests;
        if requests.max_concurrent_requests == 0 {
            return Err(config_error("max_concurrent_requests must be greater than 0"));
        }
        if requests.max_retry_attempts == 0 {
            return Err(config_error("max_retry_attempts must be greater than 0"));
        }
        if !(requests.backoff_multiplier.is_finite() && requests.backoff_multiplier > 0.0) {
            return Err(config_error("backoff_multiplier must be a positive number"));
        }
        if requests.request_timeout_ms == 0 {
            return Err(config_error("request_timeout_ms must be greater than 0"));
        }
        if self.batch.batch_size == 0 {
            return Err(config_error("batch_size must be greater than 0"));
        }
        if self.cache.cache_max_size == 0 {
            return Err(config_error("cache_max_size must be greater than 0"));
        }
        if self.api.page_size == 0 {
            return Err(config_error("page_size must be greater than 0"));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(config_error("api base_url must not be empty"));
        }
        self.availability.validate()
    }
}

fn config_error(message: &str) -> GapfinderError {
    GapfinderError::Config(message.to_string())
}
