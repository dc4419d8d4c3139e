//! Error types used throughout the application

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single remote request, after classification
///
/// Every variant carries what a caller needs to decide on messaging or a
/// deferred retry. Only [`FetchError::is_retryable`] variants are retried by
/// the request layer itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Authentication failed ({status}): {message}")]
    AuthFailed { status: u16, message: String },

    #[error("Temporary server error ({status}): {message}")]
    Temporary { status: u16, message: String },

    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

/// Fieldless discriminant of [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Network,
    Timeout,
    RateLimited,
    QuotaExceeded,
    AuthFailed,
    Temporary,
    Http,
    InvalidResponse,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::AuthFailed => "auth_failed",
            Self::Temporary => "temporary",
            Self::Http => "http",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network(_) => FetchErrorKind::Network,
            Self::Timeout(_) => FetchErrorKind::Timeout,
            Self::RateLimited { .. } => FetchErrorKind::RateLimited,
            Self::QuotaExceeded(_) => FetchErrorKind::QuotaExceeded,
            Self::AuthFailed { .. } => FetchErrorKind::AuthFailed,
            Self::Temporary { .. } => FetchErrorKind::Temporary,
            Self::Http { .. } => FetchErrorKind::Http,
            Self::InvalidResponse(_) => FetchErrorKind::InvalidResponse,
        }
    }

    /// Whether the request layer retries this error on its own
    ///
    /// Transport failures, timeouts and temporary server errors are retried.
    /// Rate limiting, quota and auth failures are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            FetchErrorKind::Network | FetchErrorKind::Timeout | FetchErrorKind::Temporary
        )
    }

    /// HTTP status attached to the error, when there was a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthFailed { status, .. }
            | Self::Temporary { status, .. }
            | Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Seconds the caller should wait before trying again, if known
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// Main error type for gapfinder
#[derive(Error, Debug)]
pub enum GapfinderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GapfinderError {
    /// The underlying fetch error kind, for request failures
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Fetch(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Result type alias for gapfinder operations
pub type Result<T> = std::result::Result<T, GapfinderError>;
