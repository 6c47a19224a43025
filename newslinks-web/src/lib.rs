//! Google News link extraction.
//!
//! - `collector`: browser-driven scrape of candidate article URLs
//! - `news_tab`: ordered strategies for reaching the News vertical
//! - `resolver`: HTTP redirect following to final landing URLs
//! - `search`: validated requests and the collect-then-resolve flow
//! - `urls`: unwrapping, filtering and deduplication helpers

pub mod collector;
pub mod news_tab;
pub mod resolver;
pub mod search;
pub mod urls;

pub use collector::{CollectorSettings, LinkCollector};
pub use resolver::{RedirectFetcher, RedirectResolver};
pub use search::{LiveNewsSearch, NewsSearch, SearchFailure, SearchOutcome, SearchRequest, run_search_blocking};
