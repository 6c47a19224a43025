//! Minimal HTTP client for following redirects to their final landing URL.
//!
//! - Sends the same user-agent as the browser session
//! - Follows redirects up to a hop limit (reqwest's default of 10)
//! - Per-request timeout, no retries
//! - Optional *raw* response-header logging via `NEWSLINKS_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), newslinks_http::HttpError> {
//! let client = newslinks_http::HttpClient::new("Mozilla/5.0")?;
//! let landing = client.final_url("https://example.com/redirect").await?;
//! println!("{landing}");
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! the response status and hop outcome, and failures. Raw header lines go to
//! target `http.raw` with cookies redacted.

use reqwest::header::HeaderMap;
use reqwest::{Client, Url, redirect};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "NEWSLINKS_HTTP_RAW";
const DEFAULT_MAX_REDIRECTS: usize = 10;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Redact cookie-bearing headers for logging.
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("set-cookie") || key.eq_ignore_ascii_case("cookie") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("too many redirects: {0}")]
    TooManyRedirects(String),
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            HttpError::Timeout(message)
        } else if err.is_redirect() {
            HttpError::TooManyRedirects(message)
        } else if err.is_builder() {
            HttpError::Build(message)
        } else {
            HttpError::Network(message)
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    user_agent: String,
    pub default_timeout: Duration,
    pub max_redirects: usize,
}

impl HttpClient {
    /// Construct a client that identifies itself with `user_agent`.
    ///
    /// ```no_run
    /// use newslinks_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("Mozilla/5.0")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_redirects, 10);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let inner = build_inner(user_agent, DEFAULT_MAX_REDIRECTS)?;
        Ok(Self {
            inner,
            user_agent: user_agent.to_string(),
            default_timeout: Duration::from_secs(15),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the redirect hop limit. Rebuilds the underlying client.
    pub fn with_max_redirects(mut self, hops: usize) -> Result<Self, HttpError> {
        self.inner = build_inner(&self.user_agent, hops)?;
        self.max_redirects = hops;
        Ok(self)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// GET `url`, follow redirects, and return the final response URL.
    ///
    /// Any HTTP status counts as an answer: a 404 landing page is still where
    /// the link points.
    pub async fn final_url(&self, url: &str) -> Result<Url, HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::Url(format!("{url}: {e}")))?;
        let req_id = uuid::Uuid::new_v4().simple().to_string();
        let host_path = format!("{}{}", parsed.host_str().unwrap_or("-"), parsed.path());

        tracing::debug!(
            req_id = %req_id,
            host_path = %host_path,
            timeout_ms = self.default_timeout.as_millis() as u64,
            max_redirects = self.max_redirects,
            "http.request.start"
        );

        let t0 = Instant::now();
        let resp = match self
            .inner
            .get(parsed)
            .timeout(self.default_timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                let err = HttpError::from(err);
                tracing::warn!(
                    req_id = %req_id,
                    host_path = %host_path,
                    duration_ms = t0.elapsed().as_millis() as u64,
                    message = %err,
                    "http.error"
                );
                return Err(err);
            }
        };

        let status = resp.status();
        let final_url = resp.url().clone();
        tracing::debug!(
            req_id = %req_id,
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            final_host = %final_url.host_str().unwrap_or("-"),
            redirected = final_url.as_str() != url,
            "http.response"
        );

        if raw_enabled() {
            let hdrs = redact_headers(resp.headers());
            tracing::debug!(target: "http.raw", %req_id, %status, headers = ?hdrs, "response");
        }

        Ok(final_url)
    }
}

fn build_inner(user_agent: &str, max_redirects: usize) -> Result<Client, HttpError> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(5))
        .redirect(redirect::Policy::limited(max_redirects))
        .build()
        .map_err(|e| HttpError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn cookies_are_redacted() {
        let mut h = HeaderMap::new();
        h.insert("set-cookie", HeaderValue::from_static("NID=secret"));
        h.insert("location", HeaderValue::from_static("https://example.com/"));
        let redacted = redact_headers(&h);
        assert!(redacted.contains(&("set-cookie".into(), "<redacted>".into())));
        assert!(redacted.contains(&("location".into(), "https://example.com/".into())));
    }

    #[tokio::test]
    async fn rejects_relative_urls() {
        let client = HttpClient::new("test-agent").unwrap();
        let err = client.final_url("/relative/path").await.unwrap_err();
        assert!(matches!(err, HttpError::Url(_)));
    }
}
