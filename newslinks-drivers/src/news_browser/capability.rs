use async_trait::async_trait;
use newslinks_common::Result;
use std::time::Duration;

/// Capabilities of a single browser page, as consumed by the link collector.
///
/// Every method takes `&mut self`: a page runs at most one action at a time,
/// and the borrow checker keeps it that way.
///
/// Element-level operations address matches of a CSS selector by index, in
/// document order, so callers never hold element handles across navigations.
#[async_trait]
pub trait SearchPage: Send {
    /// Navigate to `url`, failing with `NavigationTimeout` after `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until the document has finished parsing (`DOMContentLoaded`).
    async fn wait_for_dom_ready(&mut self, timeout: Duration) -> Result<()>;

    /// Wait until the page has loaded and stopped fetching resources.
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Wait until the first match of `selector` is displayed.
    async fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Replace the value of the first match of `selector` with `text`.
    async fn fill(&mut self, selector: &str, text: &str) -> Result<()>;

    /// Press Enter inside the first match of `selector`.
    async fn press_enter(&mut self, selector: &str) -> Result<()>;

    /// Number of elements matching `selector`.
    async fn count(&mut self, selector: &str) -> Result<usize>;

    /// Attribute `name` of the `index`-th match, `None` if absent.
    async fn attribute_at(
        &mut self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> Result<Option<String>>;

    /// Visible text of the `index`-th match.
    async fn text_at(&mut self, selector: &str, index: usize) -> Result<String>;

    /// Click the `index`-th match, giving up after `timeout`.
    async fn click_at(&mut self, selector: &str, index: usize, timeout: Duration) -> Result<()>;

    /// Visible text of the whole document body.
    async fn page_text(&mut self) -> Result<String>;

    /// PNG screenshot of the viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    async fn current_url(&mut self) -> Result<String>;

    async fn title(&mut self) -> Result<String>;

    /// Tear down the page and its browser session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Starts isolated browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Page: SearchPage + 'static;

    /// Launch a fresh session with a single page. Failures map to `Launch`.
    async fn launch(&self) -> Result<Self::Page>;
}
