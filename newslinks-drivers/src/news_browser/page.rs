use crate::news_browser::capability::SearchPage;
use async_trait::async_trait;
use fantoccini::{elements::Element, error::CmdError, Client, Locator};
use newslinks_common::{Result, SearchError};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// WebDriver key code for Enter.
const ENTER_KEY: &str = "\u{E007}";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Consecutive quiet polls required before the network counts as idle.
const QUIET_POLLS: u32 = 2;

const READY_STATE_JS: &str = "return document.readyState;";
const NETWORK_STATE_JS: &str = r#"
    return [document.readyState, performance.getEntriesByType('resource').length];
"#;
const COUNT_JS: &str = "return document.querySelectorAll(arguments[0]).length;";
const ATTRIBUTE_JS: &str = r#"
    const el = document.querySelectorAll(arguments[0])[arguments[1]];
    return el ? el.getAttribute(arguments[2]) : null;
"#;
const TEXT_JS: &str = r#"
    const el = document.querySelectorAll(arguments[0])[arguments[1]];
    return el ? (el.innerText || el.textContent || '') : null;
"#;
const BODY_TEXT_JS: &str = "return document.body ? document.body.innerText : '';";

/// A single page of a `fantoccini` session.
pub struct NewsPage {
    client: Option<Client>,
}

impl NewsPage {
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| SearchError::Driver("browser session already closed".into()))
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client()?.execute(script, args).await.map_err(driver_err)
    }

    async fn nth(&self, selector: &str, index: usize) -> Result<Element> {
        let mut all = self
            .client()?
            .find_all(Locator::Css(selector))
            .await
            .map_err(driver_err)?;
        if index < all.len() {
            Ok(all.swap_remove(index))
        } else {
            Err(SearchError::Driver(format!(
                "no element #{index} for `{selector}` ({} matches)",
                all.len()
            )))
        }
    }

    async fn first(&self, selector: &str) -> Result<Element> {
        self.nth(selector, 0).await
    }

    async fn ready_state(&self) -> Result<String> {
        let v = self.execute(READY_STATE_JS, vec![]).await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }
}

fn driver_err(e: CmdError) -> SearchError {
    SearchError::Driver(e.to_string())
}

#[async_trait]
impl SearchPage for NewsPage {
    async fn goto(&mut self, url: &str, limit: Duration) -> Result<()> {
        debug!(target: "browser.page", %url, "goto");
        let client = self.client()?;
        match timeout(limit, client.goto(url)).await {
            Ok(res) => res.map_err(driver_err),
            Err(_) => Err(SearchError::NavigationTimeout {
                url: url.to_string(),
                timeout: limit,
            }),
        }
    }

    async fn wait_for_dom_ready(&mut self, limit: Duration) -> Result<()> {
        let deadline = Instant::now() + limit;
        loop {
            match self.ready_state().await {
                Ok(state) if state == "interactive" || state == "complete" => return Ok(()),
                Ok(_) => {}
                // mid-navigation script failures are expected here
                Err(e) => debug!(target: "browser.page", error = %e, "readyState poll failed"),
            }
            if Instant::now() >= deadline {
                return Err(SearchError::NavigationTimeout {
                    url: self.current_url().await.unwrap_or_default(),
                    timeout: limit,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_network_idle(&mut self, limit: Duration) -> Result<()> {
        let deadline = Instant::now() + limit;
        let mut last_resources: Option<u64> = None;
        let mut quiet = 0u32;
        loop {
            match self.execute(NETWORK_STATE_JS, vec![]).await {
                Ok(v) => {
                    let complete = v[0].as_str() == Some("complete");
                    let resources = v[1].as_u64().unwrap_or(0);
                    if complete && last_resources == Some(resources) {
                        quiet += 1;
                        if quiet >= QUIET_POLLS {
                            return Ok(());
                        }
                    } else {
                        quiet = 0;
                    }
                    last_resources = Some(resources);
                }
                Err(e) => {
                    quiet = 0;
                    last_resources = None;
                    debug!(target: "browser.page", error = %e, "resource count poll failed");
                }
            }
            if Instant::now() >= deadline {
                return Err(SearchError::NavigationTimeout {
                    url: self.current_url().await.unwrap_or_default(),
                    timeout: limit,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_visible(&mut self, selector: &str, limit: Duration) -> Result<()> {
        let deadline = Instant::now() + limit;
        loop {
            if let Ok(elements) = self.client()?.find_all(Locator::Css(selector)).await {
                for el in elements {
                    if el.is_displayed().await.unwrap_or(false) {
                        return Ok(());
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(SearchError::ElementNotFound {
                    selector: selector.to_string(),
                    timeout: limit,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<()> {
        let el = self.first(selector).await?;
        el.clear().await.map_err(driver_err)?;
        el.send_keys(text).await.map_err(driver_err)
    }

    async fn press_enter(&mut self, selector: &str) -> Result<()> {
        let el = self.first(selector).await?;
        el.send_keys(ENTER_KEY).await.map_err(driver_err)
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        let v = self.execute(COUNT_JS, vec![json!(selector)]).await?;
        v.as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| SearchError::Driver(format!("unexpected count result: {v}")))
    }

    async fn attribute_at(
        &mut self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> Result<Option<String>> {
        let v = self
            .execute(ATTRIBUTE_JS, vec![json!(selector), json!(index), json!(name)])
            .await?;
        Ok(v.as_str().map(str::to_string))
    }

    async fn text_at(&mut self, selector: &str, index: usize) -> Result<String> {
        let v = self
            .execute(TEXT_JS, vec![json!(selector), json!(index)])
            .await?;
        match v {
            Value::String(s) => Ok(s),
            _ => Err(SearchError::Driver(format!(
                "no element #{index} for `{selector}`"
            ))),
        }
    }

    async fn click_at(&mut self, selector: &str, index: usize, limit: Duration) -> Result<()> {
        let el = self.nth(selector, index).await?;
        match timeout(limit, el.click()).await {
            Ok(res) => res.map_err(driver_err),
            Err(_) => Err(SearchError::NavigationTimeout {
                url: format!("click {selector}[{index}]"),
                timeout: limit,
            }),
        }
    }

    async fn page_text(&mut self) -> Result<String> {
        let v = self.execute(BODY_TEXT_JS, vec![]).await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.client()?.screenshot().await.map_err(driver_err)
    }

    async fn current_url(&mut self) -> Result<String> {
        self.client()?
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(driver_err)
    }

    async fn title(&mut self) -> Result<String> {
        self.client()?.title().await.map_err(driver_err)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            debug!(target: "browser.session", "closing browser session");
            if let Err(e) = client.close().await {
                warn!(target: "browser.session", error = %e, "browser close failed");
                return Err(driver_err(e));
            }
        }
        Ok(())
    }
}
