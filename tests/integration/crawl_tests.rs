//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small two-page catalogue and drive
//! full sessions through the controller.

use catalogue_scraper::config::Config;
use catalogue_scraper::crawler::Controller;
use catalogue_scraper::output::{ChannelSink, JsonFileSink, LogLine, LogSink, TracingSink};
use catalogue_scraper::{ExtractedRecord, ScrapeError, SessionStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_1: &str = r#"<html><body>
    <ol class="row">
      <li><article class="product_pod"><h3><a href="../../alpha_1/index.html">Alpha</a></h3></article></li>
      <li><article class="product_pod"><h3><a href="../../beta_2/index.html">Beta</a></h3></article></li>
    </ol>
    <ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>
    </body></html>"#;

const PAGE_2: &str = r#"<html><body>
    <ol class="row">
      <li><article class="product_pod"><h3><a href="../../gamma_3/index.html">Gamma</a></h3></article></li>
    </ol>
    <ul class="pager"><li class="previous"><a href="page-1.html">previous</a></li></ul>
    </body></html>"#;

fn detail_page(title: &str, upc: &str, rating: &str, stock: u32) -> String {
    format!(
        r#"<html><body><article class="product_page">
        <div class="row">
          <div class="col-sm-6"><div class="item active"><img src="../../media/{upc}.jpg" alt="{title}" /></div></div>
          <div class="col-sm-6 product_main">
            <h1>{title}</h1>
            <p class="star-rating {rating}"><i class="icon-star"></i></p>
          </div>
        </div>
        <table class="table table-striped">
          <tr><th>UPC</th><td>{upc}</td></tr>
          <tr><th>Price (excl. tax)</th><td>£51.77</td></tr>
          <tr><th>Availability</th><td>In stock ({stock} available)</td></tr>
          <tr><th>Number of reviews</th><td>4</td></tr>
        </table>
        </article></body></html>"#
    )
}

/// Mounts the two listing pages and their three detail pages
async fn mount_catalogue(server: &MockServer, expected_hits: Option<u64>) {
    let pages = [
        ("/catalogue/category/page-1.html", PAGE_1.to_string()),
        ("/catalogue/category/page-2.html", PAGE_2.to_string()),
        (
            "/catalogue/alpha_1/index.html",
            detail_page("Alpha", "a1", "One", 3),
        ),
        (
            "/catalogue/beta_2/index.html",
            detail_page("Beta", "b2", "Four", 7),
        ),
        (
            "/catalogue/gamma_3/index.html",
            detail_page("Gamma", "c3", "Five", 0),
        ),
    ];

    for (page_path, body) in pages {
        let mock = Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(body));
        let mock = match expected_hits {
            Some(hits) => mock.expect(hits),
            None => mock,
        };
        mock.mount(server).await;
    }
}

/// Configuration pointed at the mock site, with pacing disabled
fn test_config(server: &MockServer, cache_dir: Option<&Path>) -> Config {
    let mut config = Config::default();
    config.site.start_url = format!("{}/catalogue/category/page-1.html", server.uri());
    config.site.catalogue_base = format!("{}/catalogue/", server.uri());
    config.site.asset_base = format!("{}/", server.uri());
    config.pacing.min_delay_ms = 0;
    config.pacing.max_delay_ms = 0;

    match cache_dir {
        Some(dir) => {
            config.http.cache_enabled = true;
            config.http.cache_dir = dir.display().to_string();
        }
        None => config.http.cache_enabled = false,
    }

    config
}

fn start_url(config: &Config) -> Url {
    Url::parse(&config.site.start_url).expect("Failed to parse start URL")
}

/// Polls the controller until it reports `status`
async fn wait_for_status(controller: &Controller, status: SessionStatus) {
    for _ in 0..500 {
        if controller.current_status() == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "session never reached {} (still {})",
        status,
        controller.current_status()
    );
}

fn drain(receiver: &mut mpsc::UnboundedReceiver<LogLine>) -> Vec<LogLine> {
    let mut lines = Vec::new();
    while let Ok(line) = receiver.try_recv() {
        lines.push(line);
    }
    lines
}

fn read_export(path: &PathBuf) -> Vec<ExtractedRecord> {
    let content = std::fs::read_to_string(path).expect("Failed to read export file");
    serde_json::from_str(&content).expect("Export file is not a JSON record array")
}

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let server = MockServer::start().await;
    mount_catalogue(&server, Some(1)).await;

    let dir = tempdir().expect("Failed to create temp dir");
    let export_path = dir.path().join("books.json");
    let config = test_config(&server, None);
    let url = start_url(&config);

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let log: Arc<dyn LogSink> = Arc::new(ChannelSink::new(sender));
    let mut controller = Controller::new(config, log).expect("Failed to build controller");
    controller
        .start_session(url, Box::new(JsonFileSink::new(&export_path)))
        .expect("Failed to start session");

    let outcome = controller.wait().await.expect("Crawl failed");

    assert_eq!(outcome.status, SessionStatus::Completed);
    assert_eq!(outcome.pages_visited, 2);

    // The page index advances by one per listing page
    let milestones: Vec<String> = drain(&mut receiver)
        .into_iter()
        .map(|line| line.message)
        .filter(|message| {
            message.starts_with("----- Request detail page") || message.starts_with("----- Scrape completed")
        })
        .collect();
    assert_eq!(
        milestones,
        vec![
            "----- Request detail page(1-1) -----",
            "----- Request detail page(1-2) -----",
            "----- Scrape completed page[1] -----",
            "----- Request detail page(2-1) -----",
            "----- Scrape completed page[2] -----",
        ]
    );
    assert_eq!(controller.current_status(), SessionStatus::Completed);

    let titles: Vec<&str> = outcome.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

    let beta = &outcome.records[1];
    assert_eq!(beta.url, format!("{}/catalogue/beta_2/index.html", server.uri()));
    assert_eq!(beta.price, "£51.77");
    assert_eq!(beta.star_rating, 4);
    assert_eq!(beta.review_count, 4);
    assert_eq!(beta.stock_count, 7);
    assert_eq!(beta.product_code, "b2");
    assert_eq!(beta.image_url, format!("{}/media/b2.jpg", server.uri()));

    // Two listing pages and three detail pages
    assert_eq!(outcome.counters.requests_sent, 5);
    assert_eq!(outcome.counters.responses_received, 5);
    assert_eq!(outcome.counters.status_codes.get(&200), Some(&5));
    assert_eq!(
        outcome.counters.fields_scraped,
        3 * ExtractedRecord::FIELD_COUNT as u64
    );

    let exported = read_export(&export_path);
    assert_eq!(exported, outcome.records);

    let raw = std::fs::read_to_string(&export_path).expect("Failed to read export file");
    assert!(raw.contains("£51.77"), "non-ASCII text must be written verbatim");
}

#[tokio::test]
async fn test_pause_and_resume() {
    let server = MockServer::start().await;
    mount_catalogue(&server, Some(1)).await;

    let dir = tempdir().expect("Failed to create temp dir");
    let export_path = dir.path().join("books.json");
    let config = test_config(&server, None);
    let url = start_url(&config);

    let mut controller =
        Controller::new(config, Arc::new(TracingSink)).expect("Failed to build controller");
    controller
        .start_session(url, Box::new(JsonFileSink::new(&export_path)))
        .expect("Failed to start session");

    // The gate is checked after each detail page, so the first one completes
    controller.request_pause();
    wait_for_status(&controller, SessionStatus::Paused).await;

    let paused_counters = controller.current_counters();
    assert_eq!(paused_counters.requests_sent, 2);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.current_status(), SessionStatus::Paused);
    assert_eq!(controller.current_counters(), paused_counters);
    assert!(!export_path.exists());

    controller.request_resume();
    let outcome = controller.wait().await.expect("Crawl failed");

    assert!(outcome.is_completed());
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.counters.requests_sent, 5);
    assert_eq!(read_export(&export_path).len(), 3);
}

#[tokio::test]
async fn test_toggle_pause() {
    let server = MockServer::start().await;
    mount_catalogue(&server, None).await;

    let dir = tempdir().expect("Failed to create temp dir");
    let config = test_config(&server, None);
    let url = start_url(&config);

    let mut controller =
        Controller::new(config, Arc::new(TracingSink)).expect("Failed to build controller");
    controller
        .start_session(url, Box::new(JsonFileSink::new(dir.path().join("books.json"))))
        .expect("Failed to start session");

    assert!(controller.toggle_pause());
    wait_for_status(&controller, SessionStatus::Paused).await;
    assert!(!controller.toggle_pause());

    // A finished session ignores pause requests
    wait_for_status(&controller, SessionStatus::Completed).await;
    assert!(!controller.toggle_pause());
    controller.request_pause();

    let outcome = controller.wait().await.expect("Crawl failed");
    assert!(outcome.is_completed());
    assert_eq!(controller.current_status(), SessionStatus::Completed);
}

#[tokio::test]
async fn test_cancel_while_paused() {
    let server = MockServer::start().await;
    mount_catalogue(&server, None).await;

    let dir = tempdir().expect("Failed to create temp dir");
    let export_path = dir.path().join("books.json");
    let config = test_config(&server, None);
    let url = start_url(&config);

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let log: Arc<dyn LogSink> = Arc::new(ChannelSink::new(sender));
    let mut controller = Controller::new(config, log).expect("Failed to build controller");
    controller
        .start_session(url, Box::new(JsonFileSink::new(&export_path)))
        .expect("Failed to start session");

    controller.request_pause();
    wait_for_status(&controller, SessionStatus::Paused).await;

    let outcome = controller
        .request_cancel()
        .await
        .expect("Cancel failed")
        .expect("Session should have been running");

    assert_eq!(outcome.status, SessionStatus::Cancelled);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.counters.requests_sent, 2);
    assert_eq!(controller.current_status(), SessionStatus::Cancelled);
    assert!(!export_path.exists(), "a cancelled session must not export");

    // Waking up to a cancellation is not a resume
    let messages: Vec<String> = drain(&mut receiver)
        .into_iter()
        .map(|line| line.message)
        .collect();
    assert!(messages.iter().any(|m| m == "----- Crawler Pause -----"));
    assert!(messages.iter().any(|m| m == "----- Crawler Cancelled -----"));
    assert!(!messages.iter().any(|m| m == "----- Crawler Resume -----"));

    // Cancelling again has nothing to act on
    assert!(controller.request_cancel().await.expect("Cancel failed").is_none());
    assert_eq!(controller.current_status(), SessionStatus::Cancelled);
}

#[tokio::test]
async fn test_network_failure_is_fatal() {
    let dir = tempdir().expect("Failed to create temp dir");
    let export_path = dir.path().join("books.json");

    let mut config = Config::default();
    config.http.cache_enabled = false;
    config.pacing.min_delay_ms = 0;
    config.pacing.max_delay_ms = 0;
    // Port 1 is never served on loopback
    let url = Url::parse("http://127.0.0.1:1/catalogue/page-1.html").expect("Invalid URL");

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let log: Arc<dyn LogSink> = Arc::new(ChannelSink::new(sender));
    let mut controller = Controller::new(config, log).expect("Failed to build controller");
    controller
        .start_session(url, Box::new(JsonFileSink::new(&export_path)))
        .expect("Failed to start session");

    let result = controller.wait().await;
    match result {
        Err(ScrapeError::Fetch(e)) => assert!(e.url().contains("127.0.0.1:1")),
        other => panic!("expected a fetch error, got {:?}", other.map(|o| o.status)),
    }

    assert_eq!(controller.current_status(), SessionStatus::Cancelled);
    let counters = controller.current_counters();
    assert_eq!(counters.requests_sent, 1);
    assert_eq!(counters.responses_received, 1);
    assert!(counters.status_codes.is_empty());
    assert!(!export_path.exists());

    let lines = drain(&mut receiver);
    assert_eq!(lines.iter().filter(|line| line.is_error()).count(), 1);
    assert!(lines
        .iter()
        .any(|line| line.message.starts_with("* Request sent count: 1")));
}

#[tokio::test]
async fn test_malformed_detail_page_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/category/page-1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_1))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/alpha_1/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>maintenance</body></html>"))
        .mount(&server)
        .await;

    let dir = tempdir().expect("Failed to create temp dir");
    let export_path = dir.path().join("books.json");
    let config = test_config(&server, None);
    let url = start_url(&config);

    let mut controller =
        Controller::new(config, Arc::new(TracingSink)).expect("Failed to build controller");
    controller
        .start_session(url, Box::new(JsonFileSink::new(&export_path)))
        .expect("Failed to start session");

    let result = controller.wait().await;
    assert!(matches!(result, Err(ScrapeError::Parse(_))));
    assert_eq!(controller.current_status(), SessionStatus::Cancelled);
    assert_eq!(controller.current_counters().requests_sent, 2);
    assert_eq!(controller.current_counters().fields_scraped, 0);
    assert!(!export_path.exists());
}

#[tokio::test]
async fn test_cache_reused_across_sessions() {
    let server = MockServer::start().await;
    // Every page reaches the network exactly once over both sessions
    mount_catalogue(&server, Some(1)).await;

    let cache_dir = tempdir().expect("Failed to create temp dir");
    let out_dir = tempdir().expect("Failed to create temp dir");
    let config = test_config(&server, Some(cache_dir.path()));
    let url = start_url(&config);

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let log: Arc<dyn LogSink> = Arc::new(ChannelSink::new(sender));
    let mut controller = Controller::new(config, log).expect("Failed to build controller");

    controller
        .start_session(
            url.clone(),
            Box::new(JsonFileSink::new(out_dir.path().join("first.json"))),
        )
        .expect("Failed to start first session");
    let first = controller.wait().await.expect("First crawl failed");
    let first_lines = drain(&mut receiver);

    controller
        .start_session(
            url,
            Box::new(JsonFileSink::new(out_dir.path().join("second.json"))),
        )
        .expect("Failed to start second session");
    let second = controller.wait().await.expect("Second crawl failed");
    let second_lines = drain(&mut receiver);

    assert_eq!(first.records, second.records);
    assert_eq!(second.counters.requests_sent, 5);
    assert_eq!(second.counters.status_codes.get(&200), Some(&5));

    let cached = |lines: &[LogLine]| {
        lines
            .iter()
            .filter(|line| line.message.contains("From cache: true"))
            .count()
    };
    assert_eq!(cached(&first_lines), 0);
    assert_eq!(cached(&second_lines), 5);
}

#[tokio::test]
async fn test_second_session_rejected_while_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/category/page-1.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE_2)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let dir = tempdir().expect("Failed to create temp dir");
    let config = test_config(&server, None);
    let url = start_url(&config);

    let mut controller =
        Controller::new(config, Arc::new(TracingSink)).expect("Failed to build controller");
    controller
        .start_session(
            url.clone(),
            Box::new(JsonFileSink::new(dir.path().join("a.json"))),
        )
        .expect("Failed to start session");

    let second = controller.start_session(url, Box::new(JsonFileSink::new(dir.path().join("b.json"))));
    assert!(matches!(second, Err(ScrapeError::SessionActive)));

    // The in-flight listing fetch finishes before the cancel is observed
    let outcome = controller
        .request_cancel()
        .await
        .expect("Cancel failed")
        .expect("Session should have been running");
    assert_eq!(outcome.status, SessionStatus::Cancelled);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.counters.requests_sent, 1);
    assert!(!dir.path().join("a.json").exists());
}
