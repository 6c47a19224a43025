//! Common types shared across the newslinks crates.
//!
//! This crate holds the error taxonomy, the per-search debug trace, the
//! stability-wait policy and the observability helpers. It stays small so
//! that every other crate can depend on it.
//!
//! # Overview
//!
//! - [`SearchError`] and [`Result`]: shared error handling
//! - [`DebugLog`]: append-only, human-readable trace of a single search
//! - [`StabilityWait`]: explicit condition wait layered with a settle delay
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use newslinks_common::DebugLog;
//!
//! let mut debug = DebugLog::new();
//! debug.push("Opened google.com and waited 1.5s");
//! assert_eq!(debug.len(), 1);
//! assert!(debug.contains("Opened google.com"));
//! ```
use std::time::Duration;

pub mod observability;

/// Desktop Chrome identity used by both the browser session and the
/// redirect resolver.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Error types used across the newslinks system.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A required DOM element did not appear within its timeout.
    #[error("element not found: `{selector}` did not become visible within {timeout:?}")]
    ElementNotFound { selector: String, timeout: Duration },

    /// A page navigation or network-idle wait exceeded its bound.
    #[error("navigation timed out after {timeout:?}: {url}")]
    NavigationTimeout { url: String, timeout: Duration },

    /// Anchor enumeration kept failing while the page was changing underneath.
    #[error("page query failed during navigation: {0}")]
    StaleQuery(String),

    /// A single candidate URL could not be resolved over HTTP.
    #[error("failed to resolve {url}: {message}")]
    RedirectResolution { url: String, message: String },

    /// The automation engine could not start a browser session.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Any other automation command failure.
    #[error("driver error: {0}")]
    Driver(String),

    /// The query was rejected before any work started.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller stopped the search before it finished.
    #[error("search cancelled")]
    Cancelled,
}

impl SearchError {
    /// Whether the collector may log this error and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SearchError::NavigationTimeout { .. } | SearchError::RedirectResolution { .. }
        )
    }
}

/// Convenient alias for results that use [`SearchError`].
pub type Result<T> = std::result::Result<T, SearchError>;

/// Ordered, append-only trace of the steps taken during one search.
///
/// Every line is mirrored to `tracing` under the `search.debug` target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugLog {
    lines: Vec<String>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational step.
    pub fn push<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        tracing::info!(target: "search.debug", "{msg}");
        self.lines.push(msg);
    }

    /// Record a step that indicates something went wrong but was absorbed.
    pub fn warn<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        tracing::warn!(target: "search.debug", "{msg}");
        self.lines.push(msg);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True if any line contains `fragment`.
    pub fn contains(&self, fragment: &str) -> bool {
        self.lines.iter().any(|l| l.contains(fragment))
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl From<DebugLog> for Vec<String> {
    fn from(log: DebugLog) -> Self {
        log.into_lines()
    }
}

/// Explicit condition wait (bounded, fails loudly) followed by a fixed settle
/// delay that absorbs post-condition rendering.
///
/// ```
/// use newslinks_common::StabilityWait;
/// use std::time::Duration;
///
/// let wait = StabilityWait::new(Duration::from_secs(15), Duration::from_millis(500));
/// assert_eq!(wait.settle, Duration::from_millis(500));
/// assert!(StabilityWait::immediate().settle.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityWait {
    pub timeout: Duration,
    pub settle: Duration,
}

impl StabilityWait {
    pub fn new(timeout: Duration, settle: Duration) -> Self {
        Self { timeout, settle }
    }

    /// No settle delay; used by tests and scripted pages.
    pub fn immediate() -> Self {
        Self {
            timeout: Duration::from_millis(50),
            settle: Duration::ZERO,
        }
    }

    /// Sleep for the settle part of the policy.
    pub async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }

    /// Settle delay rendered for debug lines, e.g. `1.5s`.
    pub fn settle_label(&self) -> String {
        format_secs(self.settle)
    }
}

/// Format a duration as seconds with at most one decimal, e.g. `1.5s`, `10s`.
pub fn format_secs(d: Duration) -> String {
    let ms = d.as_millis();
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_log_keeps_insertion_order() {
        let mut log = DebugLog::new();
        log.push("first");
        log.warn("second");
        log.push("third");
        assert_eq!(log.lines(), ["first", "second", "third"]);
        assert!(log.contains("sec"));
        assert!(!log.contains("fourth"));
    }

    #[test]
    fn recoverable_errors() {
        let timeout = SearchError::NavigationTimeout {
            url: "https://www.google.com/".into(),
            timeout: Duration::from_secs(15),
        };
        assert!(timeout.is_recoverable());
        assert!(!SearchError::Launch("no chromedriver".into()).is_recoverable());
        assert!(!SearchError::StaleQuery("gone".into()).is_recoverable());
    }

    #[test]
    fn formats_settle_labels() {
        assert_eq!(format_secs(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_secs(Duration::from_millis(500)), "0.5s");
        assert_eq!(format_secs(Duration::from_secs(10)), "10s");
    }
}
