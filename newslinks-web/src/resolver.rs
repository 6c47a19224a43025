//! Following candidate links to their final landing URLs.
use crate::urls::dedup_preserving_order;
use async_trait::async_trait;
use newslinks_common::{DebugLog, Result, SearchError};
use newslinks_http::HttpClient;
use tracing::warn;

/// One HTTP hop chain: `url` in, final landing URL out.
#[async_trait]
pub trait RedirectFetcher: Send + Sync {
    /// Failures surface as [`SearchError::RedirectResolution`].
    async fn landing_url(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl RedirectFetcher for HttpClient {
    async fn landing_url(&self, url: &str) -> Result<String> {
        self.final_url(url)
            .await
            .map(String::from)
            .map_err(|e| SearchError::RedirectResolution {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

pub struct RedirectResolver<F> {
    fetcher: F,
}

impl<F: RedirectFetcher> RedirectResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve each candidate in order, dropping the ones that fail.
    /// Never fails as a whole.
    pub async fn resolve(&self, candidates: &[String], debug: &mut DebugLog) -> Vec<String> {
        let mut resolved = Vec::with_capacity(candidates.len());
        for url in candidates {
            match self.fetcher.landing_url(url).await {
                Ok(landing) => {
                    debug.push(format!("Resolved redirect: {url} -> {landing}"));
                    resolved.push(landing);
                }
                Err(err) => {
                    let reason = match &err {
                        SearchError::RedirectResolution { message, .. } => message.clone(),
                        other => other.to_string(),
                    };
                    warn!(target: "search.resolve", %url, error = %reason, "redirect resolution failed");
                    debug.push(format!("Failed to resolve: {url} ({reason})"));
                }
            }
        }
        dedup_preserving_order(resolved)
    }
}
