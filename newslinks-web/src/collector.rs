//! Browser-driven collection of candidate article URLs.
//!
//! One [`LinkCollector::collect`] call owns one browser session: it opens the
//! search home page, submits the query, moves to the News results and scrapes
//! anchors across at most `max_pages` result pages. Soft failures land in the
//! [`DebugLog`]; only structural failures are returned as errors. The session
//! is closed on every exit path.
use crate::news_tab::open_news_results;
use crate::search::SearchRequest;
use crate::urls::{RESULTS_PER_PAGE, candidate_url, news_search_url};
use newslinks_common::{DebugLog, Result, SearchError, StabilityWait};
use newslinks_config::NewslinksConfig;
use newslinks_drivers::news_browser::capability::{BrowserLauncher, SearchPage};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const SEARCH_BOX_SELECTOR: &str = "input[name='q'], textarea[name='q']";
pub const ANCHOR_SELECTOR: &str = "a[href]";
pub const CAPTCHA_SELECTOR: &str = "iframe[src*='recaptcha']";
const UNUSUAL_TRAFFIC: &str = "unusual traffic";

/// Timing and endpoint knobs for one collection run.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub home_url: String,
    pub element_timeout: Duration,
    pub navigation_timeout: Duration,
    pub home_wait: StabilityWait,
    pub submit_wait: StabilityWait,
    pub page_wait: StabilityWait,
    pub retry_wait: StabilityWait,
}

impl CollectorSettings {
    pub fn from_config(cfg: &NewslinksConfig) -> Self {
        Self {
            home_url: cfg.search.home_url.clone(),
            element_timeout: cfg.element_timeout(),
            navigation_timeout: cfg.navigation_timeout(),
            home_wait: cfg.home_wait(),
            submit_wait: cfg.submit_wait(),
            page_wait: cfg.page_wait(),
            retry_wait: cfg.retry_wait(),
        }
    }

    /// Zero settle delays and short bounds, for scripted pages.
    pub fn immediate() -> Self {
        let wait = StabilityWait::immediate();
        Self {
            home_url: NewslinksConfig::default().search.home_url,
            element_timeout: wait.timeout,
            navigation_timeout: wait.timeout,
            home_wait: wait,
            submit_wait: wait,
            page_wait: wait,
            retry_wait: wait,
        }
    }
}

/// Unique candidates in discovery order, capped at `limit`.
#[derive(Debug)]
struct CandidateList {
    limit: usize,
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl CandidateList {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            urls: Vec::new(),
        }
    }

    /// Append `url` unless it was already seen or the list is full.
    fn push(&mut self, url: String) -> bool {
        if self.is_full() || !self.seen.insert(url.clone()) {
            return false;
        }
        self.urls.push(url);
        true
    }

    fn is_full(&self) -> bool {
        self.urls.len() >= self.limit
    }

    fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

/// Owns the page of one browser session and makes sure it gets closed.
struct Session<P: SearchPage + 'static> {
    page: Option<P>,
}

impl<P: SearchPage + 'static> Session<P> {
    fn new(page: P) -> Self {
        Self { page: Some(page) }
    }

    fn page(&mut self) -> Result<&mut P> {
        self.page
            .as_mut()
            .ok_or_else(|| SearchError::Driver("browser session already closed".into()))
    }

    async fn close(mut self) {
        if let Some(mut page) = self.page.take() {
            close_page(&mut page).await;
        }
    }
}

impl<P: SearchPage + 'static> Drop for Session<P> {
    fn drop(&mut self) {
        let Some(mut page) = self.page.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(target: "browser.session", "session abandoned; closing in background");
                handle.spawn(async move { close_page(&mut page).await });
            }
            Err(_) => {
                warn!(target: "browser.session", "session dropped outside a runtime; browser left open")
            }
        }
    }
}

async fn close_page<P: SearchPage>(page: &mut P) {
    if let Err(e) = page.close().await {
        warn!(target: "browser.session", error = %e, "browser teardown failed");
    }
}

pub struct LinkCollector<L> {
    launcher: L,
    settings: CollectorSettings,
}

impl<L: BrowserLauncher> LinkCollector<L> {
    pub fn new(launcher: L, settings: CollectorSettings) -> Self {
        Self { launcher, settings }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Launch a session, collect candidates for `request` and tear the
    /// session down again, whatever the outcome.
    pub async fn collect(
        &self,
        request: &SearchRequest,
        debug: &mut DebugLog,
    ) -> Result<Vec<String>> {
        self.collect_until(request, debug, &CancellationToken::new())
            .await
    }

    /// Like [`collect`](Self::collect), but gives up with
    /// [`SearchError::Cancelled`] as soon as `cancel` fires. The browser is
    /// closed before this returns. If the future itself is dropped, the
    /// close runs as a detached task on the current runtime.
    pub async fn collect_until(
        &self,
        request: &SearchRequest,
        debug: &mut DebugLog,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let mut session = Session::new(self.launcher.launch().await?);
        let result = match session.page() {
            Ok(page) => tokio::select! {
                r = self.collect_on(page, request, debug) => r,
                _ = cancel.cancelled() => Err(SearchError::Cancelled),
            },
            Err(e) => Err(e),
        };
        if matches!(result, Err(SearchError::Cancelled)) {
            debug.warn("Search cancelled; closing browser");
        }
        session.close().await;
        result
    }

    async fn collect_on<P: SearchPage>(
        &self,
        page: &mut P,
        request: &SearchRequest,
        debug: &mut DebugLog,
    ) -> Result<Vec<String>> {
        let s = &self.settings;

        page.goto(&s.home_url, s.navigation_timeout).await?;
        page.wait_for_dom_ready(s.home_wait.timeout).await?;
        s.home_wait.settle().await;
        debug.push(format!(
            "Opened google.com and waited {}",
            s.home_wait.settle_label()
        ));

        page.wait_for_visible(SEARCH_BOX_SELECTOR, s.element_timeout)
            .await?;
        debug.push("Found search box; filling query");
        page.fill(SEARCH_BOX_SELECTOR, request.query()).await?;
        page.press_enter(SEARCH_BOX_SELECTOR).await?;

        page.wait_for_network_idle(s.submit_wait.timeout).await?;
        s.submit_wait.settle().await;

        match page.screenshot().await {
            Ok(png) => debug!(target: "browser.page", bytes = png.len(), "post-submit screenshot"),
            Err(e) => debug!(target: "browser.page", error = %e, "screenshot failed"),
        }
        let url = page.current_url().await.unwrap_or_default();
        debug.push(format!("Search submitted; current URL: {url}"));
        let title = page.title().await.unwrap_or_default();
        debug.push(format!("Page title: {title}"));

        if let Some(signal) = detect_bot_challenge(page).await {
            debug.warn(format!(
                "Possible bot challenge detected ({signal}); continuing anyway"
            ));
        }

        open_news_results(page, request.query(), s, debug).await?;

        self.scrape_pages(page, request, debug).await
    }

    async fn scrape_pages<P: SearchPage>(
        &self,
        page: &mut P,
        request: &SearchRequest,
        debug: &mut DebugLog,
    ) -> Result<Vec<String>> {
        let s = &self.settings;
        let mut candidates = CandidateList::new(request.limit() as usize);
        let mut scanned = 0u32;

        for index in 0..request.max_pages() {
            let number = index + 1;
            if index > 0 {
                let url = news_search_url(&s.home_url, request.query(), index * RESULTS_PER_PAGE)
                    .map_err(|e| SearchError::Config(format!("home url {}: {e}", s.home_url)))?;
                match self.load_result_page(page, &url).await {
                    Ok(()) => debug.push(format!("Loaded page {number}: {url}")),
                    Err(e) if e.is_recoverable() => {
                        debug.warn(format!("Stopping pagination at page {number}: {e}"));
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }

            if let Err(e) = page.wait_for_dom_ready(s.page_wait.timeout).await {
                debug!(target: "browser.page", page = number, error = %e, "DOM-ready gate timed out");
            }

            let total = self.count_anchors(page, debug).await?;
            debug.push(format!("Page {number}: total hrefs on page: {total}"));

            for i in 0..total {
                if candidates.is_full() {
                    break;
                }
                let href = match page.attribute_at(ANCHOR_SELECTOR, i, "href").await {
                    Ok(Some(href)) => href,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(target: "browser.page", index = i, error = %e, "href read failed");
                        continue;
                    }
                };
                if let Some(url) = candidate_url(&href) {
                    candidates.push(url);
                }
            }

            scanned += 1;
            if candidates.is_full() {
                break;
            }
        }

        let urls = candidates.into_urls();
        debug.push(format!(
            "Collected {} unique candidate URLs across {scanned} page(s)",
            urls.len()
        ));
        Ok(urls)
    }

    async fn load_result_page<P: SearchPage>(&self, page: &mut P, url: &str) -> Result<()> {
        let s = &self.settings;
        page.goto(url, s.navigation_timeout).await?;
        page.wait_for_network_idle(s.page_wait.timeout).await?;
        s.page_wait.settle().await;
        Ok(())
    }

    /// Count anchors, re-waiting once if the page changed underneath us.
    async fn count_anchors<P: SearchPage>(&self, page: &mut P, debug: &mut DebugLog) -> Result<usize> {
        let first = match page.count(ANCHOR_SELECTOR).await {
            Ok(n) => return Ok(n),
            Err(e) => e,
        };
        debug.warn(format!("Retrying after navigation/context change: {first}"));

        let retry = self.settings.retry_wait;
        if let Err(e) = page.wait_for_network_idle(retry.timeout).await {
            debug!(target: "browser.page", error = %e, "retry idle wait timed out");
        }
        retry.settle().await;

        page.count(ANCHOR_SELECTOR)
            .await
            .map_err(|e| SearchError::StaleQuery(e.to_string()))
    }
}

/// Heuristic: a reCAPTCHA frame or the "unusual traffic" interstitial.
async fn detect_bot_challenge<P: SearchPage>(page: &mut P) -> Option<&'static str> {
    if page.count(CAPTCHA_SELECTOR).await.unwrap_or(0) > 0 {
        return Some("reCAPTCHA iframe");
    }
    let text = page.page_text().await.unwrap_or_default();
    if text.to_lowercase().contains(UNUSUAL_TRAFFIC) {
        return Some("unusual traffic notice");
    }
    None
}
