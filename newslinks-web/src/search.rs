//! The search entry points: collect, then resolve.
use crate::collector::{CollectorSettings, LinkCollector};
use crate::resolver::{RedirectFetcher, RedirectResolver};
use newslinks_common::{DebugLog, Result, SearchError};
use newslinks_config::NewslinksConfig;
use newslinks_drivers::news_browser::capability::BrowserLauncher;
use newslinks_drivers::news_browser::driver::NewsDriver;
use newslinks_http::HttpClient;
use newslinks_runtime::SearchRuntime;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

/// A validated query.
///
/// ```
/// use newslinks_web::SearchRequest;
///
/// let req = SearchRequest::new("  climate  ", 5).unwrap();
/// assert_eq!(req.query(), "climate");
/// assert_eq!(req.max_pages(), 3);
/// assert!(SearchRequest::new("   ", 5).is_err());
/// assert!(SearchRequest::new("climate", 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    limit: u32,
    max_pages: u32,
}

impl SearchRequest {
    pub const DEFAULT_MAX_PAGES: u32 = 3;

    pub fn new(query: &str, limit: u32) -> Result<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery("keyword is empty".into()));
        }
        if limit == 0 {
            return Err(SearchError::InvalidQuery("limit must be at least 1".into()));
        }
        Ok(Self {
            query: query.to_string(),
            limit,
            max_pages: Self::DEFAULT_MAX_PAGES,
        })
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Result<Self> {
        if max_pages == 0 {
            return Err(SearchError::InvalidQuery("max_pages must be at least 1".into()));
        }
        self.max_pages = max_pages;
        Ok(self)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }
}

/// Resolved links plus the trace of how they were found.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub urls: Vec<String>,
    pub debug: DebugLog,
}

/// A search that aborted. The trace up to the failure is kept.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct SearchFailure {
    pub error: SearchError,
    pub debug: DebugLog,
}

impl From<SearchError> for SearchFailure {
    fn from(error: SearchError) -> Self {
        Self {
            error,
            debug: DebugLog::new(),
        }
    }
}

/// The production wiring: chromedriver for collection, reqwest for
/// resolution.
pub type LiveNewsSearch = NewsSearch<NewsDriver, HttpClient>;

pub struct NewsSearch<L, F> {
    collector: LinkCollector<L>,
    resolver: RedirectResolver<F>,
}

impl LiveNewsSearch {
    /// Wire the WebDriver-backed collector and the reqwest resolver from
    /// configuration. Nothing is launched until [`NewsSearch::run`].
    pub fn from_config(cfg: &NewslinksConfig) -> Result<Self> {
        let http = HttpClient::new(&cfg.browser.user_agent)
            .and_then(|c| c.with_max_redirects(cfg.http.max_redirects))
            .map_err(|e| SearchError::Config(format!("http client: {e}")))?
            .with_timeout(cfg.http_timeout());
        let collector = LinkCollector::new(
            NewsDriver::from_settings(&cfg.browser),
            CollectorSettings::from_config(cfg),
        );
        Ok(Self::new(collector, RedirectResolver::new(http)))
    }
}

impl<L: BrowserLauncher, F: RedirectFetcher> NewsSearch<L, F> {
    pub fn new(collector: LinkCollector<L>, resolver: RedirectResolver<F>) -> Self {
        Self {
            collector,
            resolver,
        }
    }

    /// Collect candidates in a fresh browser session, then resolve them.
    pub async fn run(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<SearchOutcome, SearchFailure> {
        self.run_until(request, &CancellationToken::new()).await
    }

    /// [`run`](Self::run), failing with `Cancelled` once `cancel` fires.
    /// The browser is closed before this returns.
    pub async fn run_until(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<SearchOutcome, SearchFailure> {
        let search_id = uuid::Uuid::new_v4().simple().to_string();
        let span = info_span!(
            "search",
            search_id = %search_id,
            query = %request.query(),
            limit = request.limit(),
            max_pages = request.max_pages()
        );

        async move {
            let started = Instant::now();
            let mut debug = DebugLog::new();

            let candidates = match self.collector.collect_until(request, &mut debug, cancel).await {
                Ok(urls) => urls,
                Err(error) => {
                    error!(error = %error, elapsed_ms = started.elapsed().as_millis() as u64, "search.failed");
                    return Err(SearchFailure { error, debug });
                }
            };

            let urls = tokio::select! {
                urls = self.resolver.resolve(&candidates, &mut debug) => urls,
                _ = cancel.cancelled() => {
                    let error = SearchError::Cancelled;
                    error!(error = %error, "search.failed");
                    return Err(SearchFailure { error, debug });
                }
            };
            info!(
                candidates = candidates.len(),
                resolved = urls.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "search.complete"
            );
            Ok(SearchOutcome { urls, debug })
        }
        .instrument(span)
        .await
    }
}

/// Synchronous bridge for callers outside any async runtime.
///
/// The query is validated before a browser is ever launched.
pub fn run_search_blocking(
    cfg: &NewslinksConfig,
    query: &str,
    limit: u32,
) -> std::result::Result<SearchOutcome, SearchFailure> {
    let request = SearchRequest::new(query, limit)?.with_max_pages(cfg.search.max_pages)?;
    let search = LiveNewsSearch::from_config(cfg)?;

    let runtime = SearchRuntime::build("newslinks-search", Some(2))
        .map_err(|e| SearchError::Launch(format!("tokio runtime: {e}")))?;
    let outcome = runtime.block_on(search.run(&request));
    runtime.shutdown(Duration::from_millis(250));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_fails_before_anything_launches() {
        let cfg = NewslinksConfig::default();
        let failure = run_search_blocking(&cfg, "  \t ", 12).unwrap_err();
        assert!(matches!(failure.error, SearchError::InvalidQuery(_)));
        assert!(failure.debug.is_empty());
    }

    #[test]
    fn max_pages_must_be_positive() {
        let req = SearchRequest::new("rust", 5).unwrap();
        assert!(req.clone().with_max_pages(0).is_err());
        assert_eq!(req.with_max_pages(1).unwrap().max_pages(), 1);
    }

    #[test]
    fn failure_displays_inner_error() {
        let failure = SearchFailure::from(SearchError::Launch("no chromedriver".into()));
        assert_eq!(failure.to_string(), "browser launch failed: no chromedriver");
    }
}
