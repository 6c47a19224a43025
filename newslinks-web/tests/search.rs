mod common;

use common::{FakeFetcher, FakeLauncher, FakeSite, init_test_tracing, news_tabs, results_page};
use newslinks_common::SearchError;
use newslinks_web::{
    CollectorSettings, LinkCollector, NewsSearch, RedirectResolver, SearchRequest,
};
use tokio_util::sync::CancellationToken;

fn search(launcher: &FakeLauncher, fetcher: FakeFetcher) -> NewsSearch<FakeLauncher, FakeFetcher> {
    NewsSearch::new(
        LinkCollector::new(launcher.clone(), CollectorSettings::immediate()),
        RedirectResolver::new(fetcher),
    )
}

#[tokio::test]
async fn collects_then_resolves() {
    init_test_tracing();
    let launcher = FakeLauncher::new(FakeSite {
        news_links: news_tabs(),
        result_pages: vec![results_page(&[
            "https://a.example/amp/1",
            "https://b.example/2",
            "https://a.example/1",
        ])],
        ..FakeSite::default()
    });
    let fetcher = FakeFetcher::with(&[
        ("https://a.example/amp/1", "https://a.example/1"),
        ("https://a.example/1", "https://a.example/1"),
    ]);

    let request = SearchRequest::new("rust", 5).unwrap();
    let outcome = search(&launcher, fetcher).run(&request).await.unwrap();

    assert_eq!(outcome.urls, ["https://a.example/1"]);
    assert!(outcome.debug.contains("Collected 3 unique candidate URLs"));
    assert!(outcome.debug.contains("Failed to resolve: https://b.example/2"));
    assert_eq!(launcher.closes(), 1);
}

#[tokio::test]
async fn zero_results_is_success() {
    let launcher = FakeLauncher::new(FakeSite {
        news_links: news_tabs(),
        ..FakeSite::default()
    });
    let request = SearchRequest::new("nothing here", 5)
        .unwrap()
        .with_max_pages(1)
        .unwrap();

    let outcome = search(&launcher, FakeFetcher::default())
        .run(&request)
        .await
        .unwrap();

    assert!(outcome.urls.is_empty());
    assert!(outcome.debug.contains("Collected 0 unique candidate URLs across 1 page(s)"));
}

#[tokio::test]
async fn failure_keeps_the_trace() {
    let launcher = FakeLauncher::new(FakeSite {
        search_box_missing: true,
        ..FakeSite::default()
    });
    let request = SearchRequest::new("rust", 5).unwrap();

    let failure = search(&launcher, FakeFetcher::default())
        .run(&request)
        .await
        .unwrap_err();

    assert!(matches!(failure.error, SearchError::ElementNotFound { .. }));
    assert!(failure.debug.contains("Opened google.com"));
    assert_eq!(launcher.closes(), 1);
}

#[tokio::test]
async fn cancelled_search_fails_with_closed_browser() {
    init_test_tracing();
    let launcher = FakeLauncher::new(FakeSite {
        news_links: news_tabs(),
        submit_hangs: true,
        ..FakeSite::default()
    });
    let search = search(&launcher, FakeFetcher::default());
    let request = SearchRequest::new("climate", 3).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let failure = search.run_until(&request, &cancel).await.unwrap_err();

    assert_eq!(failure.error, SearchError::Cancelled);
    assert!(failure.debug.contains("Search cancelled"));
    assert_eq!(launcher.closes(), 1);
}

#[test]
fn empty_keyword_never_launches() {
    let launcher = FakeLauncher::new(FakeSite::default());
    let err = SearchRequest::new("   ", 5).unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));
    assert_eq!(launcher.journal.lock().unwrap().launches, 0);
}
