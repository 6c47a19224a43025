//! URL normalisation for scraped search-result anchors.
use std::collections::HashSet;
use url::Url;

/// Hosts owned by the search engine itself; links to them are navigation,
/// not articles.
const ENGINE_HOST_SUFFIXES: &[&str] = &["google.com", "google.co.in", "gstatic.com", "about.google"];
const ENGINE_HOST_PREFIX: &str = "news.google.";
const ENGINE_HOST_MARKER: &str = "google.";

/// Results per search page; pagination steps `start` by this amount.
pub const RESULTS_PER_PAGE: u32 = 10;

/// Extract the real target from a search-engine redirect link.
///
/// `https://www.google.com/url?q=https://example.com/a&sa=U` becomes
/// `https://example.com/a`. The `url` parameter wins over `q` when both are
/// present. Anything else, including unparseable input, comes back unchanged.
pub fn unwrap_redirect(href: &str) -> String {
    let Ok(parsed) = Url::parse(href) else {
        return href.to_string();
    };
    let is_engine = parsed
        .host_str()
        .is_some_and(|h| h.to_ascii_lowercase().contains(ENGINE_HOST_MARKER));
    if !is_engine {
        return href.to_string();
    }

    first_param(&parsed, "url")
        .or_else(|| first_param(&parsed, "q"))
        .unwrap_or_else(|| href.to_string())
}

fn first_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// True when `href` points at a search-engine property. Unparseable or
/// host-less URLs also count, since they can never be article candidates.
pub fn is_search_engine_url(href: &str) -> bool {
    let Some(host) = Url::parse(href)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return true;
    };

    ENGINE_HOST_SUFFIXES.iter().any(|s| host.ends_with(s))
        || host.starts_with(ENGINE_HOST_PREFIX)
        || host.contains(ENGINE_HOST_MARKER)
}

fn is_http(href: &str) -> bool {
    href.starts_with("http")
}

/// Turn a raw anchor `href` into an article candidate, or `None` when the
/// link is empty, not HTTP(S) or stays on the search engine after
/// unwrapping.
pub fn candidate_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || !is_http(raw) {
        return None;
    }
    let unwrapped = unwrap_redirect(raw);
    if !is_http(&unwrapped) || is_search_engine_url(&unwrapped) {
        return None;
    }
    Some(unwrapped)
}

/// `<home>/search?q=<query>&tbm=nws[&start=<n>]`.
pub fn news_search_url(home: &str, query: &str, start: u32) -> Result<String, url::ParseError> {
    let mut url = Url::parse(home)?.join("/search")?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.append_pair("q", query);
        pairs.append_pair("tbm", "nws");
        if start > 0 {
            pairs.append_pair("start", &start.to_string());
        }
    }
    Ok(url.into())
}

/// Remove repeated entries, keeping the first occurrence of each.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_prefers_q_target_on_engine_hosts() {
        assert_eq!(
            unwrap_redirect("https://www.google.com/url?q=https://example.com/a&other=1"),
            "https://example.com/a"
        );
    }

    #[test]
    fn unwrap_prefers_url_param_over_q() {
        assert_eq!(
            unwrap_redirect(
                "https://www.google.com/url?q=https://a.example/&url=https://b.example/story"
            ),
            "https://b.example/story"
        );
    }

    #[test]
    fn unwrap_skips_empty_url_param() {
        assert_eq!(
            unwrap_redirect("https://www.google.com/url?url=&q=https://example.com/x"),
            "https://example.com/x"
        );
    }

    #[test]
    fn unwrap_is_identity_elsewhere() {
        for href in [
            "https://example.com/a?q=https://other.example/",
            "https://news.example.org/story/1",
            "not a url",
            "https://www.google.com/search?tbm=nws",
        ] {
            assert_eq!(unwrap_redirect(href), href);
        }
    }

    #[test]
    fn engine_hosts_are_excluded() {
        assert!(is_search_engine_url("https://news.google.com/articles/abc"));
        assert!(is_search_engine_url("https://fonts.gstatic.com/s/roboto"));
        assert!(is_search_engine_url("https://about.google/products/"));
        assert!(is_search_engine_url("https://www.google.co.in/search?q=x"));
        assert!(is_search_engine_url("https://support.GOOGLE.com/"));
        assert!(is_search_engine_url("https://maps.google.de/"));
        assert!(is_search_engine_url("garbage"));
        assert!(!is_search_engine_url("https://www.reuters.com/world/"));
    }

    #[test]
    fn candidate_filters_and_unwraps() {
        assert_eq!(candidate_url(""), None);
        assert_eq!(candidate_url("#top"), None);
        assert_eq!(candidate_url("/search?q=x"), None);
        assert_eq!(candidate_url("javascript:void(0)"), None);
        assert_eq!(candidate_url("https://accounts.google.com/ServiceLogin"), None);
        assert_eq!(
            candidate_url("https://www.google.com/url?q=/relative&sa=U"),
            None
        );
        assert_eq!(
            candidate_url(" https://www.google.com/url?q=https://bbc.co.uk/news/1 "),
            Some("https://bbc.co.uk/news/1".into())
        );
        assert_eq!(
            candidate_url("https://apnews.com/article/x"),
            Some("https://apnews.com/article/x".into())
        );
    }

    #[test]
    fn news_url_encodes_query_and_start() {
        let first = news_search_url("https://www.google.com/", "rust lang & co", 0).unwrap();
        assert_eq!(
            first,
            "https://www.google.com/search?q=rust+lang+%26+co&tbm=nws"
        );
        let third = news_search_url("https://www.google.com/", "rust", 20).unwrap();
        assert_eq!(third, "https://www.google.com/search?q=rust&tbm=nws&start=20");
    }

    #[test]
    fn news_url_rejects_bad_home() {
        assert!(news_search_url("not a base", "rust", 0).is_err());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let out = dedup_preserving_order(["A", "B", "A", "C"].map(String::from));
        assert_eq!(out, ["A", "B", "C"]);
    }
}
