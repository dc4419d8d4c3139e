//! Domain defaults
//!
//! Centralized location for the default values used by configuration and by
//! the request layer.

// Request layer
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 3;
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 5_000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const RETRY_JITTER_FRACTION: f64 = 0.25;

/// Block applied on HTTP 429 when the response names no wait
pub const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

// Batching
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 1_000;

// Response cache
pub const DEFAULT_CACHE_MAX_SIZE: usize = 100;
pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 5;

// Availability
pub const DEFAULT_BUFFER_MINUTES: u32 = 15;
pub const DEFAULT_MIN_SLOT_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_CORE_TIME_START_HOUR: u32 = 10;
pub const DEFAULT_CORE_TIME_END_HOUR: u32 = 22;

// Google Calendar API
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const EVENTS_PAGE_SIZE: u32 = 250;
