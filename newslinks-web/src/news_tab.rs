//! Switching a results page over to the News vertical.
use crate::collector::CollectorSettings;
use crate::urls::news_search_url;
use newslinks_common::{DebugLog, Result, SearchError};
use newslinks_drivers::news_browser::capability::SearchPage;
use std::fmt;

/// Anchors that lead to the News vertical.
pub const NEWS_LINK_SELECTOR: &str = "a[href*='tbm=nws']";
const NEWS_TAB_LABEL: &str = "News";

/// Ways of reaching the News results, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsTabStrategy {
    /// A `tbm=nws` anchor whose visible text is exactly "News".
    LabelledTab,
    /// Any `tbm=nws` anchor.
    AnyNewsLink,
    /// Navigate straight to the constructed `tbm=nws` URL.
    DirectUrl,
}

pub const NEWS_TAB_STRATEGIES: [NewsTabStrategy; 3] = [
    NewsTabStrategy::LabelledTab,
    NewsTabStrategy::AnyNewsLink,
    NewsTabStrategy::DirectUrl,
];

impl fmt::Display for NewsTabStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NewsTabStrategy::LabelledTab => "labelled tab",
            NewsTabStrategy::AnyNewsLink => "any news link",
            NewsTabStrategy::DirectUrl => "direct url",
        })
    }
}

impl NewsTabStrategy {
    fn clicks(self) -> bool {
        !matches!(self, NewsTabStrategy::DirectUrl)
    }

    /// Indices into [`NEWS_LINK_SELECTOR`] matches this strategy would click.
    async fn candidates<P: SearchPage>(self, page: &mut P) -> Result<Vec<usize>> {
        let total = page.count(NEWS_LINK_SELECTOR).await?;
        match self {
            NewsTabStrategy::LabelledTab => {
                let mut found = Vec::new();
                for index in 0..total {
                    let text = page.text_at(NEWS_LINK_SELECTOR, index).await?;
                    if text.trim() == NEWS_TAB_LABEL {
                        found.push(index);
                    }
                }
                Ok(found)
            }
            NewsTabStrategy::AnyNewsLink => Ok((0..total).collect()),
            NewsTabStrategy::DirectUrl => Ok(Vec::new()),
        }
    }
}

/// Bring `page` to the first page of News results for `query`.
///
/// The first click strategy with any candidates wins and its first match is
/// clicked; a click that fails skips straight to the direct URL. Returns the
/// strategy that produced the page.
pub async fn open_news_results<P: SearchPage>(
    page: &mut P,
    query: &str,
    settings: &CollectorSettings,
    debug: &mut DebugLog,
) -> Result<NewsTabStrategy> {
    let mut chosen = None;
    for strategy in NEWS_TAB_STRATEGIES.into_iter().filter(|s| s.clicks()) {
        match strategy.candidates(page).await {
            Ok(found) if !found.is_empty() => {
                chosen = Some((strategy, found));
                break;
            }
            Ok(_) => {}
            Err(e) => debug.warn(format!("News tab lookup ({strategy}) failed: {e}")),
        }
    }
    let found = chosen.as_ref().map_or(0, |(_, c)| c.len());
    debug.push(format!("News tab candidates found: {found}"));

    match chosen.and_then(|(strategy, c)| c.first().map(|&index| (strategy, index))) {
        Some((strategy, index)) => {
            debug.push("Clicking News tab");
            match click_and_wait(page, index, settings).await {
                Ok(()) => {
                    let url = page.current_url().await.unwrap_or_default();
                    debug.push(format!("Post-click URL: {url}"));
                    return Ok(strategy);
                }
                Err(e) => debug.warn(format!("Click failed: {e}, using direct URL instead")),
            }
        }
        None => debug.push("News tab not found; attempting direct tbm=nws URL"),
    }

    load_direct(page, query, settings, debug).await?;
    Ok(NewsTabStrategy::DirectUrl)
}

async fn click_and_wait<P: SearchPage>(
    page: &mut P,
    index: usize,
    settings: &CollectorSettings,
) -> Result<()> {
    page.click_at(NEWS_LINK_SELECTOR, index, settings.navigation_timeout)
        .await?;
    page.wait_for_network_idle(settings.page_wait.timeout).await?;
    settings.page_wait.settle().await;
    Ok(())
}

async fn load_direct<P: SearchPage>(
    page: &mut P,
    query: &str,
    settings: &CollectorSettings,
    debug: &mut DebugLog,
) -> Result<()> {
    let url = news_search_url(&settings.home_url, query, 0)
        .map_err(|e| SearchError::Config(format!("home url {}: {e}", settings.home_url)))?;

    let loaded = match page.goto(&url, settings.navigation_timeout).await {
        Ok(()) => page.wait_for_network_idle(settings.page_wait.timeout).await,
        Err(e) => Err(e),
    };
    match loaded {
        Ok(()) => {}
        Err(e) if e.is_recoverable() => {
            debug.warn(format!("Fallback News URL did not settle: {e}"));
        }
        Err(e) => return Err(e),
    }
    settings.page_wait.settle().await;

    let current = page.current_url().await.unwrap_or_default();
    debug.push(format!("Loaded fallback News URL: {current}"));
    Ok(())
}
