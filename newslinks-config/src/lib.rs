//! Loader for newslinks configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (every field has one, an empty file is valid)
//! 2. YAML files / inline snippets, in the order they were attached
//! 3. `NEWSLINKS__SECTION__KEY` environment variables
//!
//! String values may reference `${VAR}` placeholders, expanded after merging.
//!
//! ```yaml
//! browser:
//!   webdriver_url: "http://localhost:9515"
//!   headless: true
//! search:
//!   max_pages: 3
//!   default_limit: 12
//! timeouts:
//!   element_ms: 10000
//!   navigation_ms: 15000
//! http:
//!   timeout_ms: 15000
//! ```
use config::{Config, Environment, File, FileFormat};
use newslinks_common::observability::LogFormat;
use newslinks_common::{DEFAULT_USER_AGENT, StabilityWait};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "NEWSLINKS";
pub const DEFAULT_CONFIG_FILE: &str = "newslinks.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewslinksConfig {
    pub version: Option<String>,
    pub browser: BrowserSettings,
    pub search: SearchSettings,
    pub timeouts: TimeoutSettings,
    pub stability: StabilitySettings,
    pub http: HttpSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub viewport: Viewport,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            user_agent: DEFAULT_USER_AGENT.into(),
            viewport: Viewport::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub home_url: String,
    pub max_pages: u32,
    pub default_limit: u32,
    pub min_limit: u32,
    pub max_limit: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            home_url: "https://www.google.com/".into(),
            max_pages: 3,
            default_limit: 12,
            min_limit: 3,
            max_limit: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub element_ms: u64,
    pub navigation_ms: u64,
    pub retry_idle_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            element_ms: 10_000,
            navigation_ms: 15_000,
            retry_idle_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StabilitySettings {
    pub home_settle_ms: u64,
    pub submit_settle_ms: u64,
    pub page_settle_ms: u64,
}

impl Default for StabilitySettings {
    fn default() -> Self {
        Self {
            home_settle_ms: 1_500,
            submit_settle_ms: 1_000,
            page_settle_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_ms: u64,
    pub max_redirects: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            max_redirects: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: false,
            filter: "info".into(),
        }
    }
}

impl NewslinksConfig {
    /// Reject values the search flow cannot honour.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let s = &self.search;
        if s.max_pages == 0 {
            return Err(ConfigLoadError::Invalid("search.max_pages must be >= 1".into()));
        }
        if s.min_limit == 0 || s.min_limit > s.max_limit {
            return Err(ConfigLoadError::Invalid(format!(
                "search limit range {}..={} is empty",
                s.min_limit, s.max_limit
            )));
        }
        if !(s.min_limit..=s.max_limit).contains(&s.default_limit) {
            return Err(ConfigLoadError::Invalid(format!(
                "search.default_limit {} outside {}..={}",
                s.default_limit, s.min_limit, s.max_limit
            )));
        }
        if self.browser.user_agent.trim().is_empty() {
            return Err(ConfigLoadError::Invalid("browser.user_agent is empty".into()));
        }
        Ok(())
    }

    /// Clamp a user-selected limit into the configured range.
    pub fn clamp_limit(&self, limit: u32) -> u32 {
        limit.clamp(self.search.min_limit, self.search.max_limit)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.element_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.navigation_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http.timeout_ms)
    }

    /// DOM-ready wait on the home page, then the long settle that absorbs
    /// on-load scripts.
    pub fn home_wait(&self) -> StabilityWait {
        StabilityWait::new(
            self.navigation_timeout(),
            Duration::from_millis(self.stability.home_settle_ms),
        )
    }

    /// Network-idle wait after submitting the query.
    pub fn submit_wait(&self) -> StabilityWait {
        StabilityWait::new(
            self.navigation_timeout(),
            Duration::from_millis(self.stability.submit_settle_ms),
        )
    }

    /// Network-idle wait after each news-tab or pagination navigation.
    pub fn page_wait(&self) -> StabilityWait {
        StabilityWait::new(
            self.navigation_timeout(),
            Duration::from_millis(self.stability.page_settle_ms),
        )
    }

    /// Re-wait applied before retrying a failed anchor count.
    pub fn retry_wait(&self) -> StabilityWait {
        StabilityWait::new(
            Duration::from_millis(self.timeouts.retry_idle_ms),
            Duration::from_millis(self.stability.page_settle_ms),
        )
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Candidate config paths: `./newslinks.yaml`, then the per-user config dir.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("newslinks").join(DEFAULT_CONFIG_FILE));
    }
    paths
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct NewslinksConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    use_env: bool,
}

impl Default for NewslinksConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl NewslinksConfigLoader {
    /// Start from defaults with `NEWSLINKS__` env overrides enabled.
    ///
    /// ```
    /// use newslinks_config::NewslinksConfigLoader;
    ///
    /// let config = NewslinksConfigLoader::new()
    ///     .with_yaml_str("search:\n  max_pages: 2")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.search.max_pages, 2);
    /// assert_eq!(config.search.default_limit, 12);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            use_env: true,
        }
    }

    /// Ignore `NEWSLINKS__*` variables; used where the environment must not leak in.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Attach the first existing file from [`default_config_paths`], if any.
    pub fn with_default_files(self) -> Self {
        match default_config_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => self.with_file(path),
            None => self,
        }
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and validate.
    ///
    /// ```
    /// use newslinks_config::NewslinksConfigLoader;
    ///
    /// unsafe { std::env::set_var("NEWSLINKS_DOC_DRIVER", "http://chromedriver:4444"); }
    ///
    /// let config = NewslinksConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// browser:
    ///   webdriver_url: "${NEWSLINKS_DOC_DRIVER}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.browser.webdriver_url, "http://chromedriver:4444");
    ///
    /// unsafe { std::env::remove_var("NEWSLINKS_DOC_DRIVER"); }
    /// ```
    pub fn load(self) -> Result<NewslinksConfig, ConfigLoadError> {
        let mut builder = self.builder;
        if self.use_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: NewslinksConfig = serde_json::from_value(v)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!({ "nested": ["X=${FOO}"] });
                expand_env_in_value(&mut v);
                assert_eq!(v, json!({ "nested": ["X=start-mid-qux-end"] }));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = NewslinksConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.search.max_pages, 3);
        assert_eq!(cfg.browser.viewport, Viewport { width: 1280, height: 900 });
        assert_eq!(cfg.home_wait().settle, Duration::from_millis(1500));
        assert_eq!(cfg.element_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn clamps_limit_into_range() {
        let cfg = NewslinksConfig::default();
        assert_eq!(cfg.clamp_limit(1), 3);
        assert_eq!(cfg.clamp_limit(12), 12);
        assert_eq!(cfg.clamp_limit(99), 30);
    }

    #[test]
    fn rejects_inverted_limit_range() {
        let mut cfg = NewslinksConfig::default();
        cfg.search.min_limit = 40;
        assert!(matches!(cfg.validate(), Err(ConfigLoadError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_pages() {
        let err = NewslinksConfigLoader::new()
            .without_env()
            .with_yaml_str("search:\n  max_pages: 0")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("max_pages"));
    }
}
