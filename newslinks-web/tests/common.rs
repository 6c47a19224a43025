#![allow(dead_code)]

use async_trait::async_trait;
use newslinks_common::observability::{LogConfig, LogFormat};
use newslinks_common::{Result, SearchError};
use newslinks_drivers::news_browser::capability::{BrowserLauncher, SearchPage};
use newslinks_web::RedirectFetcher;
use newslinks_web::collector::{ANCHOR_SELECTOR, CAPTCHA_SELECTOR, SEARCH_BOX_SELECTOR};
use newslinks_web::news_tab::NEWS_LINK_SELECTOR;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "newslinks-tests",
            log_dir: Some(std::env::temp_dir().join("newslinks-tests")),
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug".into(),
        };
        newslinks_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub const HOME: &str = "https://www.google.com/";

/// What the scripted search engine serves.
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub search_box_missing: bool,
    pub submit_never_idles: bool,
    /// The post-submit idle wait never returns.
    pub submit_hangs: bool,
    pub captcha: bool,
    pub body_text: String,
    /// `(visible text, href)` of anchors matching the News-link selector.
    pub news_links: Vec<(String, String)>,
    pub click_fails: bool,
    /// Anchor hrefs per News results page.
    pub result_pages: Vec<Vec<String>>,
    /// Navigating to this page index or later times out.
    pub pagination_times_out_at: Option<u32>,
    /// Number of leading `a[href]` counts that fail.
    pub anchor_count_failures: usize,
    /// Loading the first News page by URL times out, though it does render.
    pub direct_news_times_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Blank,
    Home,
    Serp,
    News(u32),
}

/// What the collector did to the page.
#[derive(Debug, Default)]
pub struct Journal {
    pub visited: Vec<String>,
    pub filled: Vec<String>,
    pub clicked: Vec<usize>,
    pub closes: usize,
    pub launches: usize,
}

pub struct FakePage {
    site: FakeSite,
    location: Location,
    anchor_failures_left: usize,
    journal: Arc<Mutex<Journal>>,
}

fn timeout_err(url: &str) -> SearchError {
    SearchError::NavigationTimeout {
        url: url.to_string(),
        timeout: Duration::from_millis(50),
    }
}

fn news_page_index(url: &str) -> Option<u32> {
    if !url.contains("tbm=nws") {
        return None;
    }
    let start = url
        .split(['?', '&'])
        .find_map(|kv| kv.strip_prefix("start="))
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0);
    Some(start / 10)
}

impl FakePage {
    fn anchors(&self) -> &[String] {
        match &self.location {
            Location::News(i) => self
                .site
                .result_pages
                .get(*i as usize)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            _ => &[],
        }
    }

    fn url(&self) -> String {
        match &self.location {
            Location::Blank => "about:blank".into(),
            Location::Home => HOME.into(),
            Location::Serp => format!("{HOME}search?q=fake"),
            Location::News(0) => format!("{HOME}search?q=fake&tbm=nws"),
            Location::News(i) => format!("{HOME}search?q=fake&tbm=nws&start={}", i * 10),
        }
    }
}

#[async_trait]
impl SearchPage for FakePage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.journal.lock().unwrap().visited.push(url.to_string());
        if let Some(index) = news_page_index(url) {
            if self.site.pagination_times_out_at.is_some_and(|n| index >= n) {
                return Err(timeout_err(url));
            }
            self.location = Location::News(index);
            if index == 0 && self.site.direct_news_times_out {
                return Err(timeout_err(url));
            }
        } else if url == HOME {
            self.location = Location::Home;
        } else {
            return Err(SearchError::Driver(format!("unexpected url {url}")));
        }
        Ok(())
    }

    async fn wait_for_dom_ready(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<()> {
        if self.location == Location::Serp {
            if self.site.submit_hangs {
                std::future::pending::<()>().await;
            }
            if self.site.submit_never_idles {
                return Err(timeout_err(&self.url()));
            }
        }
        Ok(())
    }

    async fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        if selector == SEARCH_BOX_SELECTOR && !self.site.search_box_missing {
            return Ok(());
        }
        Err(SearchError::ElementNotFound {
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn fill(&mut self, _selector: &str, text: &str) -> Result<()> {
        self.journal.lock().unwrap().filled.push(text.to_string());
        Ok(())
    }

    async fn press_enter(&mut self, _selector: &str) -> Result<()> {
        self.location = Location::Serp;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        match selector {
            CAPTCHA_SELECTOR => Ok(usize::from(self.site.captcha)),
            NEWS_LINK_SELECTOR if self.location == Location::Serp => {
                Ok(self.site.news_links.len())
            }
            NEWS_LINK_SELECTOR => Ok(0),
            ANCHOR_SELECTOR => {
                if self.anchor_failures_left > 0 {
                    self.anchor_failures_left -= 1;
                    return Err(SearchError::Driver("execution context was destroyed".into()));
                }
                Ok(self.anchors().len())
            }
            other => Err(SearchError::Driver(format!("unexpected selector {other}"))),
        }
    }

    async fn attribute_at(
        &mut self,
        selector: &str,
        index: usize,
        _name: &str,
    ) -> Result<Option<String>> {
        match selector {
            ANCHOR_SELECTOR => Ok(self.anchors().get(index).cloned()),
            NEWS_LINK_SELECTOR => Ok(self.site.news_links.get(index).map(|(_, h)| h.clone())),
            _ => Ok(None),
        }
    }

    async fn text_at(&mut self, selector: &str, index: usize) -> Result<String> {
        if selector == NEWS_LINK_SELECTOR {
            if let Some((text, _)) = self.site.news_links.get(index) {
                return Ok(text.clone());
            }
        }
        Err(SearchError::Driver(format!("no element #{index}")))
    }

    async fn click_at(&mut self, selector: &str, index: usize, _timeout: Duration) -> Result<()> {
        self.journal.lock().unwrap().clicked.push(index);
        if self.site.click_fails {
            return Err(timeout_err(&format!("click {selector}[{index}]")));
        }
        self.location = Location::News(0);
        Ok(())
    }

    async fn page_text(&mut self) -> Result<String> {
        Ok(self.site.body_text.clone())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.url())
    }

    async fn title(&mut self) -> Result<String> {
        Ok("fake - Google Search".into())
    }

    async fn close(&mut self) -> Result<()> {
        self.journal.lock().unwrap().closes += 1;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub site: FakeSite,
    pub launch_fails: bool,
    pub journal: Arc<Mutex<Journal>>,
}

impl FakeLauncher {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            ..Self::default()
        }
    }

    pub fn closes(&self) -> usize {
        self.journal.lock().unwrap().closes
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Page = FakePage;

    async fn launch(&self) -> Result<FakePage> {
        self.journal.lock().unwrap().launches += 1;
        if self.launch_fails {
            return Err(SearchError::Launch("chromedriver not reachable".into()));
        }
        Ok(FakePage {
            site: self.site.clone(),
            location: Location::Blank,
            anchor_failures_left: self.site.anchor_count_failures,
            journal: self.journal.clone(),
        })
    }
}

/// Google's News vertical: a labelled tab and a few other `tbm=nws` links.
pub fn news_tabs() -> Vec<(String, String)> {
    vec![
        ("Images".into(), "/search?q=fake&tbm=isch&tbm=nws".into()),
        ("News".into(), "/search?q=fake&tbm=nws".into()),
    ]
}

/// A results page mixing engine chrome, redirect wrappers and articles.
pub fn results_page(articles: &[&str]) -> Vec<String> {
    let mut hrefs = vec![
        "https://www.google.com/preferences".to_string(),
        "/search?q=fake&tbm=nws&start=10".to_string(),
        "https://accounts.google.com/ServiceLogin".to_string(),
        "#".to_string(),
    ];
    for (i, article) in articles.iter().enumerate() {
        if i % 2 == 0 {
            hrefs.push(format!("https://www.google.com/url?q={article}&sa=U"));
        } else {
            hrefs.push(article.to_string());
        }
    }
    hrefs.push("https://support.google.com/websearch".to_string());
    hrefs
}

/// Maps each URL to a landing URL, or fails it.
#[derive(Default)]
pub struct FakeFetcher {
    pub landings: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            landings: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RedirectFetcher for FakeFetcher {
    async fn landing_url(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.landings
            .get(url)
            .cloned()
            .ok_or_else(|| SearchError::RedirectResolution {
                url: url.to_string(),
                message: "connection refused".into(),
            })
    }
}
