use newslinks_config::BrowserSettings;
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// Identity and window of a browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchProfile {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub viewport: (u32, u32),
}

impl From<&BrowserSettings> for LaunchProfile {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            webdriver_url: settings.webdriver_url.clone(),
            headless: settings.headless,
            user_agent: settings.user_agent.clone(),
            viewport: (settings.viewport.width, settings.viewport.height),
        }
    }
}

/// Construct Chrome command-line arguments for a launch profile.
///
/// Sandboxing is disabled so Chrome can start inside containers and other
/// constrained environments.
pub fn build_launch_arguments(profile: &LaunchProfile) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
        "--incognito".to_string(),
        format!("--user-agent={}", profile.user_agent),
        format!("--window-size={},{}", profile.viewport.0, profile.viewport.1),
        "--lang=en-US".to_string(),
    ];
    if profile.headless {
        args.push("--headless=new".to_string());
    }
    args
}

/// WebDriver capabilities requesting Chrome with [`build_launch_arguments`].
pub fn chrome_capabilities(profile: &LaunchProfile) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": build_launch_arguments(profile) }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(headless: bool) -> LaunchProfile {
        LaunchProfile {
            webdriver_url: "http://localhost:9515".into(),
            headless,
            user_agent: "UA/1.0".into(),
            viewport: (1280, 900),
        }
    }

    #[test]
    fn arguments_carry_identity_and_window() {
        let args = build_launch_arguments(&profile(true));
        assert!(args.contains(&"--user-agent=UA/1.0".to_string()));
        assert!(args.contains(&"--window-size=1280,900".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
    }

    #[test]
    fn headful_profile_omits_headless_flag() {
        let args = build_launch_arguments(&profile(false));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn capabilities_embed_chrome_args() {
        let caps = chrome_capabilities(&profile(true));
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--disable-dev-shm-usage"));
    }

    #[test]
    fn profile_from_settings() {
        let settings = BrowserSettings::default();
        let p = LaunchProfile::from(&settings);
        assert_eq!(p.viewport, (1280, 900));
        assert!(p.headless);
    }
}
