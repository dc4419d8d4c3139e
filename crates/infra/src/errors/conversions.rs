//! Conversions from transport failures and error responses into
//! [`FetchError`].

use gapfinder_domain::FetchError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;
use serde_json::Value;

/// Extension trait making the transport conversion explicit at call sites.
pub trait IntoFetchError {
    fn into_fetch_error(self) -> FetchError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FetchError */
/* -------------------------------------------------------------------------- */

impl IntoFetchError for HttpError {
    fn into_fetch_error(self) -> FetchError {
        if self.is_timeout() {
            return FetchError::Network(format!("HTTP request timed out: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return FetchError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() || self.is_body() {
            return FetchError::Network(format!("failed to read HTTP response body: {self}"));
        }

        if self.is_builder() {
            return FetchError::InvalidResponse(format!("could not build HTTP request: {self}"));
        }

        FetchError::Network(format!("HTTP request failed: {self}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Error responses */
/* -------------------------------------------------------------------------- */

/// Classify a non-2xx response
///
/// `body` is the parsed error body (`{ "error": { "message", "errors" } }`),
/// or an empty object when the body was missing or not JSON.
/// `retry_after_secs` is the wait the response asked for, used for 429s.
pub fn classify_status(status: StatusCode, body: &Value, retry_after_secs: u64) -> FetchError {
    let code = status.as_u16();
    let message = error_message(status, body);

    match code {
        429 => FetchError::RateLimited { retry_after_secs },
        403 if mentions_quota(body) => FetchError::QuotaExceeded(message),
        401 | 403 => FetchError::AuthFailed { status: code, message },
        408 => FetchError::Temporary { status: code, message },
        _ if status.is_server_error() => FetchError::Temporary { status: code, message },
        _ => FetchError::Http { status: code, message },
    }
}

fn error_message(status: StatusCode, body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!("HTTP {} {}", status.as_u16(), status.canonical_reason().unwrap_or("unknown"))
        })
}

fn mentions_quota(body: &Value) -> bool {
    let has_quota = |text: &str| text.to_ascii_lowercase().contains("quota");

    let in_message = body.pointer("/error/message").and_then(Value::as_str).is_some_and(has_quota);
    let in_reasons = body
        .pointer("/error/errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| {
            errors
                .iter()
                .filter_map(|entry| entry.get("reason").and_then(Value::as_str))
                .any(has_quota)
        });

    in_message || in_reasons
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
