use std::sync::Arc;
use std::time::Duration;

use gapfinder_common::resilience::{ceil_secs, RateLimitSignals, RateLimitTracker, RetryConfig};
use gapfinder_domain::constants::{DEFAULT_RATE_LIMIT_WAIT_SECS, RETRY_JITTER_FRACTION};
use gapfinder_domain::{FetchError, GapfinderError, RequestConfig, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::request::FetchRequest;
use crate::errors::{classify_status, IntoFetchError};

const RETRY_AFTER: &str = "retry-after";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// HTTP fetcher with timeout, classification, retry and shared rate-limit
/// awareness.
///
/// Every attempt first consults the shared [`RateLimitTracker`]: while a
/// block is active the call fails with [`FetchError::RateLimited`] without
/// touching the network. Only retryable errors (network, timeout, temporary
/// server errors) are retried, up to the configured number of attempts.
#[derive(Clone)]
pub struct ResilientFetcher {
    client: ReqwestClient,
    retry: RetryConfig,
    timeout: Duration,
    rate_limits: Arc<RateLimitTracker>,
}

impl ResilientFetcher {
    /// Start building a new fetcher.
    pub fn builder() -> ResilientFetcherBuilder {
        ResilientFetcherBuilder::default()
    }

    /// Fetcher configured from the `[requests]` settings.
    pub fn from_config(config: &RequestConfig) -> Result<Self> {
        Self::builder().request_config(config)?.build()
    }

    pub fn rate_limits(&self) -> &Arc<RateLimitTracker> {
        &self.rate_limits
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute the request with retry semantics and decode the JSON body.
    ///
    /// Exhausting the attempts surfaces the last classified error.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn fetch(&self, request: &FetchRequest) -> std::result::Result<Value, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            if let Some(wait) = self.rate_limits.remaining_wait() {
                let retry_after_secs = ceil_secs(wait);
                warn!(retry_after_secs, "request blocked by active rate limit");
                return Err(FetchError::RateLimited { retry_after_secs });
            }

            match self.send_once(request, attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && self.retry.allows_retry_after(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying request"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, error = %err, "request failed");
                    return Err(err);
                }
            }
        }
    }

    async fn send_once(
        &self,
        request: &FetchRequest,
        attempt: u32,
    ) -> std::result::Result<Value, FetchError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(attempt = attempt + 1, "sending HTTP request");

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        let (status, headers, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
            .map_err(|err| err.into_fetch_error())?;

        debug!(attempt = attempt + 1, %status, "received HTTP response");

        let applied = self.rate_limits.observe(&rate_limit_signals(&headers));

        if status.is_success() {
            return parse_success_body(&body);
        }

        let retry_after_secs = if status == StatusCode::TOO_MANY_REQUESTS {
            match applied {
                Some(wait) => ceil_secs(wait),
                None => {
                    self.rate_limits.block_for(Duration::from_secs(DEFAULT_RATE_LIMIT_WAIT_SECS));
                    DEFAULT_RATE_LIMIT_WAIT_SECS
                }
            }
        } else {
            0
        };

        let error_body = serde_json::from_str::<Value>(&body)
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Err(classify_status(status, &error_body, retry_after_secs))
    }
}

/// Empty bodies decode to `null`; anything else must be JSON.
fn parse_success_body(body: &str) -> std::result::Result<Value, FetchError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| FetchError::InvalidResponse(err.to_string()))
}

fn rate_limit_signals(headers: &HeaderMap) -> RateLimitSignals {
    let header = |name: &str| {
        headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
    };
    RateLimitSignals {
        retry_after: header(RETRY_AFTER),
        remaining: header(RATE_LIMIT_REMAINING),
        reset: header(RATE_LIMIT_RESET),
    }
}

/// Builder for [`ResilientFetcher`].
pub struct ResilientFetcherBuilder {
    timeout: Duration,
    retry: RetryConfig,
    user_agent: Option<String>,
    rate_limits: Option<Arc<RateLimitTracker>>,
}

impl Default for ResilientFetcherBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(RequestConfig::default().request_timeout_ms),
            retry: RetryConfig::default(),
            user_agent: None,
            rate_limits: None,
        }
    }
}

impl ResilientFetcherBuilder {
    /// Hard timeout for each attempt, covering the response body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Apply timeout and retry values from configuration.
    pub fn request_config(self, config: &RequestConfig) -> Result<Self> {
        let retry = RetryConfig::builder()
            .max_attempts(config.max_retry_attempts)
            .exponential_backoff(
                Duration::from_millis(config.initial_retry_delay_ms),
                config.backoff_multiplier,
                Duration::from_millis(config.max_retry_delay_ms),
            )
            .proportional_jitter(RETRY_JITTER_FRACTION)
            .build()
            .map_err(GapfinderError::Config)?;

        Ok(self.timeout(Duration::from_millis(config.request_timeout_ms)).retry(retry))
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Share rate-limit state with other fetchers (defaults to a fresh one).
    pub fn rate_limits(mut self, tracker: Arc<RateLimitTracker>) -> Self {
        self.rate_limits = Some(tracker);
        self
    }

    pub fn build(self) -> Result<ResilientFetcher> {
        self.retry.validate().map_err(GapfinderError::Config)?;

        let mut builder = ReqwestClient::builder().no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(|err| {
            GapfinderError::Internal(format!("failed to build HTTP client: {err}"))
        })?;

        Ok(ResilientFetcher {
            client,
            retry: self.retry,
            timeout: self.timeout,
            rate_limits: self.rate_limits.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use gapfinder_domain::FetchErrorKind;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher_with_attempts(attempts: u32) -> ResilientFetcher {
        let retry = RetryConfig::builder()
            .max_attempts(attempts)
            .exponential_backoff(Duration::from_millis(10), 2.0, Duration::from_millis(40))
            .no_jitter()
            .build()
            .unwrap();
        ResilientFetcher::builder()
            .retry(retry)
            .timeout(Duration::from_millis(500))
            .build()
            .expect("fetcher")
    }

    fn get(server: &MockServer, route: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(&format!("{}{}", server.uri(), route)).unwrap())
    }

    #[tokio::test]
    async fn returns_json_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(3);
        let value = fetcher.fetch(&get(&server, "/calendars").with_bearer("abc")).await.unwrap();

        assert_eq!(value, json!({ "items": [] }));
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(503)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({ "ok": true }))
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(3);
        let value = fetcher.fetch(&get(&server, "/")).await.unwrap();

        assert_eq!(value, json!({ "ok": true }));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_last_error_after_exhausting_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "error": { "message": "Backend Error" } })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(2);
        let err = fetcher.fetch(&get(&server, "/")).await.unwrap_err();

        assert_eq!(err, FetchError::Temporary { status: 500, message: "Backend Error".into() });
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(3);
        let err = fetcher.fetch(&get(&server, "/")).await.unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::Http);
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn does_not_retry_auth_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "error": { "message": "Invalid Credentials" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher_with_attempts(3).fetch(&get(&server, "/")).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::AuthFailed { status: 401, message: "Invalid Credentials".into() }
        );
    }

    #[tokio::test]
    async fn rate_limited_response_blocks_later_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(3);
        let first = fetcher.fetch(&get(&server, "/a")).await.unwrap_err();
        assert_eq!(first, FetchError::RateLimited { retry_after_secs: 30 });

        // Blocked locally: the server sees no second request.
        let second = fetcher.fetch(&get(&server, "/b")).await.unwrap_err();
        let wait = second.retry_after_secs().unwrap();
        assert!(wait > 0 && wait <= 30, "unexpected wait {wait}");
        assert!(fetcher.rate_limits().is_limited());
    }

    #[tokio::test]
    async fn rate_limited_without_retry_after_uses_default_wait() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(3);
        let err = fetcher.fetch(&get(&server, "/")).await.unwrap_err();

        assert_eq!(err, FetchError::RateLimited { retry_after_secs: DEFAULT_RATE_LIMIT_WAIT_SECS });
        assert!(fetcher.rate_limits().remaining_wait().unwrap() > Duration::from_secs(50));
    }

    #[tokio::test]
    async fn exhausted_quota_headers_block_after_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-RateLimit-Remaining", "0")
                    .insert_header("X-RateLimit-Reset", "20")
                    .set_body_json(json!({})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(3);
        assert!(fetcher.fetch(&get(&server, "/")).await.is_ok());

        let err = fetcher.fetch(&get(&server, "/")).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn remaining_quota_does_not_block() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-RateLimit-Remaining", "17")
                    .insert_header("X-RateLimit-Reset", "20")
                    .set_body_json(json!({})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher_with_attempts(3);
        assert!(fetcher.fetch(&get(&server, "/")).await.is_ok());
        assert!(fetcher.fetch(&get(&server, "/")).await.is_ok());
    }

    #[tokio::test]
    async fn slow_responses_time_out_and_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let fetcher = ResilientFetcher::builder()
            .retry(
                RetryConfig::builder()
                    .max_attempts(2)
                    .exponential_backoff(Duration::ZERO, 2.0, Duration::ZERO)
                    .build()
                    .unwrap(),
            )
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = fetcher.fetch(&get(&server, "/")).await.unwrap_err();

        assert_eq!(err, FetchError::Timeout(Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn empty_body_decodes_to_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(204)).mount(&server).await;

        let value = fetcher_with_attempts(1).fetch(&get(&server, "/")).await.unwrap();

        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn non_json_success_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher_with_attempts(3).fetch(&get(&server, "/")).await.unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = Url::parse(&format!("http://{addr}/")).unwrap();

        let err = fetcher_with_attempts(2).fetch(&FetchRequest::get(url)).await.unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::Network);
    }

    #[test]
    fn from_config_rejects_zero_attempts() {
        let config = RequestConfig { max_retry_attempts: 0, ..RequestConfig::default() };
        assert!(matches!(ResilientFetcher::from_config(&config), Err(GapfinderError::Config(_))));

        let fetcher = ResilientFetcher::from_config(&RequestConfig::default()).unwrap();
        assert_eq!(fetcher.retry_config().max_attempts, 3);
        assert_eq!(fetcher.timeout(), Duration::from_secs(10));
    }
}
