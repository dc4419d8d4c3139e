//! Access-token port
//!
//! The OAuth flow lives outside this crate; the calendar client only asks
//! for a bearer token before each operation.

use std::fmt;

use async_trait::async_trait;
use gapfinder_domain::{FetchError, GapfinderError, Result};

/// Source of bearer tokens for calendar requests
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A currently valid access token
    ///
    /// Failures are reported as [`FetchError::AuthFailed`] so they surface
    /// alongside other per-calendar auth errors.
    async fn access_token(&self) -> std::result::Result<String, FetchError>;
}

/// Fixed token, e.g. from the environment
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Read the token from an environment variable.
    ///
    /// # Errors
    /// Returns `GapfinderError::Config` when the variable is unset or empty.
    pub fn from_env(key: &str) -> Result<Self> {
        match std::env::var(key) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(GapfinderError::Config(format!("{key} is not set"))),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> std::result::Result<String, FetchError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_is_returned() {
        let provider = StaticTokenProvider::new("ya29.token");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.token");
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let provider = StaticTokenProvider::new("ya29.secret");
        let rendered = format!("{provider:?}");

        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_from_env_requires_value() {
        std::env::remove_var("GAPFINDER_TEST_MISSING_TOKEN");
        let err = StaticTokenProvider::from_env("GAPFINDER_TEST_MISSING_TOKEN").unwrap_err();
        assert!(matches!(err, GapfinderError::Config(_)));
    }
}
