//! Driver layer for browser automation.
//!
//! This crate exposes the page capabilities the link collector needs and a
//! WebDriver-backed implementation of them.
//!
//! - [`news_browser::capability::SearchPage`]: one exclusively owned page
//! - [`news_browser::capability::BrowserLauncher`]: starts isolated sessions
//! - [`news_browser::driver::NewsDriver`]: `fantoccini` launcher
//! - [`news_browser::page::NewsPage`]: `fantoccini` page implementation
//! - [`news_browser::launch`]: Chrome arguments and capabilities
pub mod news_browser;
