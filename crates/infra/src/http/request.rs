//! Description of one remote call, independent of any attempt.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// A request the fetcher may send several times
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// JSON body, sent with `Content-Type: application/json`
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach `Authorization: Bearer <token>`
    ///
    /// Tokens that are not valid header values are dropped, and the call then
    /// fails upstream with an auth error.
    pub fn with_bearer(mut self, token: &str) -> Self {
        if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            value.set_sensitive(true);
            self.headers.insert(AUTHORIZATION, value);
        }
        self
    }

    /// Whether the response may be served from and stored in the cache
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }

    /// Cache key: method, URL and body. Headers (including auth) are not part
    /// of the key.
    pub fn cache_key(&self) -> String {
        match &self.body {
            Some(body) => format!("{} {} {}", self.method, self.url, body),
            None => format!("{} {}", self.method, self.url),
        }
    }
}
