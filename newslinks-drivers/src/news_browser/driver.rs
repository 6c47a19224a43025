use crate::news_browser::{
    capability::BrowserLauncher,
    launch::{chrome_capabilities, LaunchProfile},
    page::NewsPage,
};
use async_trait::async_trait;
use fantoccini::ClientBuilder;
use newslinks_common::{Result, SearchError};
use newslinks_config::BrowserSettings;
use tracing::info;

/// Launches WebDriver sessions (Chromedriver by default) with the configured
/// identity. Each [`BrowserLauncher::launch`] call gets its own session, so
/// cookies and storage never leak between searches.
#[derive(Debug, Clone)]
pub struct NewsDriver {
    profile: LaunchProfile,
}

impl NewsDriver {
    pub fn new(profile: LaunchProfile) -> Self {
        Self { profile }
    }

    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self::new(LaunchProfile::from(settings))
    }

    pub fn profile(&self) -> &LaunchProfile {
        &self.profile
    }
}

#[async_trait]
impl BrowserLauncher for NewsDriver {
    type Page = NewsPage;

    async fn launch(&self) -> Result<NewsPage> {
        info!(
            target: "browser.session",
            webdriver = %self.profile.webdriver_url,
            headless = self.profile.headless,
            "launching browser session"
        );
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(&self.profile))
            .connect(&self.profile.webdriver_url)
            .await
            .map_err(|e| {
                SearchError::Launch(format!("{} ({e})", self.profile.webdriver_url))
            })?;

        let (w, h) = self.profile.viewport;
        if let Err(e) = client.set_window_size(w, h).await {
            tracing::debug!(target: "browser.session", error = %e, "window resize ignored");
        }

        Ok(NewsPage::new(client))
    }
}
