//! Integration tests for the fetch, scan and filter pipeline
//!
//! These tests use wiremock to create mock HTTP servers, plus in-process
//! fetchers and resolvers where the network is beside the point.

use getjs::config::{Config, ExtractionPoints, PipelineOptions};
use getjs::crawler::{PageFetcher, Resolver, Runner};
use getjs::output::{open_append, ResultSink};
use getjs::{GetJsError, WorkItem};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_BODY: &str = r#"<html><head>
    <script src="/a.js"></script>
    <script data-src="//cdn.e.com/b.js"></script>
</head><body>
    <script src="https://o.com/c.js"></script>
</body></html>"#;

/// Serves fixed bodies keyed by URL; unknown URLs fail like a dead host
#[derive(Default)]
struct MapFetcher {
    pages: HashMap<String, String>,
}

impl MapFetcher {
    fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, GetJsError> {
        self.pages
            .get(url.as_str())
            .map(|body| body.clone().into_bytes())
            .ok_or_else(|| GetJsError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Rejects any URL whose path ends with the given suffix
struct RejectSuffix {
    suffix: &'static str,
    calls: Arc<AtomicUsize>,
}

impl RejectSuffix {
    fn new(suffix: &'static str) -> Self {
        Self {
            suffix,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Resolver for RejectSuffix {
    async fn resolves(&self, url: &Url) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        !url.path().ends_with(self.suffix)
    }
}

/// Counts how many fetches are in flight at once
#[derive(Clone, Default)]
struct FetchCounters {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

struct InstrumentedFetcher {
    counters: FetchCounters,
    delay: Duration,
}

impl PageFetcher for InstrumentedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, GetJsError> {
        let now = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        self.counters.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.counters.active.fetch_sub(1, Ordering::SeqCst);

        if url.path() == "/fail" {
            return Err(GetJsError::HttpStatus {
                url: url.to_string(),
                status: 500,
            });
        }
        Ok(format!(r#"<script src="{}.js"></script>"#, url.path()).into_bytes())
    }
}

fn options(complete: bool, resolve: bool, threads: usize) -> PipelineOptions {
    PipelineOptions {
        complete,
        resolve,
        threads,
    }
}

fn page(url: &str) -> WorkItem {
    WorkItem::PageUrl(Url::parse(url).expect("valid test URL"))
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Runs the pipeline and collects every result
async fn collect<F, R>(runner: &Runner<F, R>, items: Vec<WorkItem>) -> (getjs::RunSummary, Vec<String>)
where
    F: PageFetcher,
    R: Resolver,
{
    let (sender, mut receiver) = mpsc::channel(1);
    let consumer = tokio::spawn(async move {
        let mut results = Vec::new();
        while let Some(result) = receiver.recv().await {
            results.push(result);
        }
        results
    });

    let summary = runner.run(items, sender).await;
    let results = consumer.await.expect("consumer task panicked");
    (summary, results)
}

#[tokio::test]
async fn test_completion_without_resolution() {
    let runner = Runner::from_parts(
        MapFetcher::default().with_page("http://e.com/page.html", PAGE_BODY),
        RejectSuffix::new("b.js"),
        ExtractionPoints::default(),
        options(true, false, 2),
    );

    let (summary, results) = collect(&runner, vec![page("http://e.com/page.html")]).await;

    assert_eq!(summary.items, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.results, 3);
    assert_eq!(
        results.into_iter().collect::<HashSet<_>>(),
        set(&["http://e.com/a.js", "http://cdn.e.com/b.js", "https://o.com/c.js"])
    );
}

#[tokio::test]
async fn test_resolution_drops_dead_candidates() {
    let resolver = RejectSuffix::new("b.js");
    let calls = Arc::clone(&resolver.calls);
    let runner = Runner::from_parts(
        MapFetcher::default().with_page("http://e.com/page.html", PAGE_BODY),
        resolver,
        ExtractionPoints::default(),
        options(true, true, 2),
    );

    let (_, results) = collect(&runner, vec![page("http://e.com/page.html")]).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        results.into_iter().collect::<HashSet<_>>(),
        set(&["http://e.com/a.js", "https://o.com/c.js"])
    );
}

#[tokio::test]
async fn test_resolution_without_completion_is_skipped() {
    let resolver = RejectSuffix::new(".js");
    let calls = Arc::clone(&resolver.calls);
    let runner = Runner::from_parts(
        MapFetcher::default().with_page("http://e.com/page.html", PAGE_BODY),
        resolver,
        ExtractionPoints::default(),
        options(false, true, 2),
    );

    let (_, results) = collect(&runner, vec![page("http://e.com/page.html")]).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        results.into_iter().collect::<HashSet<_>>(),
        set(&["/a.js", "//cdn.e.com/b.js", "https://o.com/c.js"])
    );
}

#[tokio::test]
async fn test_single_thread_keeps_document_order() {
    let runner = Runner::from_parts(
        MapFetcher::default().with_page("http://e.com/page.html", PAGE_BODY),
        RejectSuffix::new("never"),
        ExtractionPoints::default(),
        options(true, false, 1),
    );

    let (_, results) = collect(&runner, vec![page("http://e.com/page.html")]).await;
    assert_eq!(
        results,
        vec!["http://e.com/a.js", "http://cdn.e.com/b.js", "https://o.com/c.js"]
    );
}

#[tokio::test]
async fn test_concurrency_never_exceeds_thread_count() {
    let counters = FetchCounters::default();
    let runner = Runner::from_parts(
        InstrumentedFetcher {
            counters: counters.clone(),
            delay: Duration::from_millis(30),
        },
        RejectSuffix::new("never"),
        ExtractionPoints::default(),
        options(false, false, 3),
    );

    let items: Vec<WorkItem> = (0..12)
        .map(|i| page(&format!("http://e.com/p{}", i)))
        .collect();
    let (summary, results) = collect(&runner, items).await;

    assert_eq!(counters.calls.load(Ordering::SeqCst), 12);
    assert_eq!(counters.active.load(Ordering::SeqCst), 0);
    let peak = counters.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {} exceeded 3", peak);
    assert!(peak >= 1);
    assert_eq!(summary.results, 12);
    assert_eq!(results.len(), 12);
}

#[tokio::test]
async fn test_failed_fetches_release_their_slot() {
    let counters = FetchCounters::default();
    let runner = Runner::from_parts(
        InstrumentedFetcher {
            counters: counters.clone(),
            delay: Duration::from_millis(5),
        },
        RejectSuffix::new("never"),
        ExtractionPoints::default(),
        options(false, false, 1),
    );

    let items = vec![
        page("http://e.com/fail"),
        page("http://e.com/fail"),
        page("http://e.com/ok"),
    ];
    let (summary, results) = collect(&runner, items).await;

    assert_eq!(summary.items, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(results, vec!["/ok.js"]);
    assert_eq!(counters.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_http_pipeline_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_BODY))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.pipeline.complete = true;
    let runner = Runner::new(&config).unwrap();

    let page_url = format!("{}/page.html", server.uri());
    let (summary, results) = collect(&runner, vec![page(&page_url)]).await;

    assert_eq!(summary.failed, 0);
    assert_eq!(
        results.into_iter().collect::<HashSet<_>>(),
        [
            format!("{}/a.js", server.uri()),
            "http://cdn.e.com/b.js".to_string(),
            "https://o.com/c.js".to_string(),
        ]
        .into_iter()
        .collect::<HashSet<_>>()
    );
}

#[tokio::test]
async fn test_http_resolution_keeps_live_scripts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<script src="/live.js"></script><script src="/dead.js"></script>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/live.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("void 0"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dead.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.pipeline.complete = true;
    config.pipeline.resolve = true;
    let runner = Runner::new(&config).unwrap();

    let (_, results) = collect(&runner, vec![page(&format!("{}/", server.uri()))]).await;
    assert_eq!(results, vec![format!("{}/live.js", server.uri())]);
}

#[tokio::test]
async fn test_page_fetch_uses_configured_method_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app"))
        .and(header("x-api-key", "secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<script src="/bundle.js"></script>"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bundle.js"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.request.method = "POST".to_string();
    config.request.headers = vec!["X-Api-Key: secret".to_string()];
    config.pipeline.complete = true;
    config.pipeline.resolve = true;
    let runner = Runner::new(&config).unwrap();

    let (_, results) = collect(&runner, vec![page(&format!("{}/app", server.uri()))]).await;
    assert_eq!(results, vec![format!("{}/bundle.js", server.uri())]);
}

#[tokio::test]
async fn test_failures_are_local_to_their_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<script src="https://o.com/c.js"></script>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let refused = format!("http://127.0.0.1:{}/", listener.local_addr().unwrap().port());
    drop(listener);

    let mut config = Config::default();
    config.request.timeout = 2;
    let runner = Runner::new(&config).unwrap();

    let items = vec![
        page(&refused),
        page(&format!("{}/missing", server.uri())),
        page(&format!("{}/ok", server.uri())),
    ];
    let (summary, results) = collect(&runner, items).await;

    assert_eq!(summary.items, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(results, vec!["https://o.com/c.js"]);
}

#[tokio::test]
async fn test_run_to_sinks_appends_to_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    std::fs::write(&second, "previous\n").unwrap();

    let runner = Runner::from_parts(
        MapFetcher::default().with_page("http://e.com/page.html", PAGE_BODY),
        RejectSuffix::new("never"),
        ExtractionPoints::default(),
        options(true, false, 1),
    );

    let sinks: Vec<Box<dyn ResultSink>> = vec![
        Box::new(open_append(&first).unwrap()),
        Box::new(open_append(&second).unwrap()),
    ];
    let summary = runner
        .run_to_sinks(vec![page("http://e.com/page.html")], sinks)
        .await
        .unwrap();

    assert_eq!(summary.results, 3);
    let expected = "http://e.com/a.js\nhttp://cdn.e.com/b.js\nhttps://o.com/c.js\n";
    assert_eq!(std::fs::read_to_string(&first).unwrap(), expected);
    assert_eq!(
        std::fs::read_to_string(&second).unwrap(),
        format!("previous\n{}", expected)
    );
}

#[tokio::test]
async fn test_raw_body_and_custom_extraction_points() {
    let body = br#"<link rel="modulepreload" href="/mod.js"><script src="/a.js"></script>"#;
    let points = ExtractionPoints::empty().with("link", ["href"]);
    let runner = Runner::from_parts(
        MapFetcher::default(),
        RejectSuffix::new("never"),
        points,
        options(true, false, 2),
    );

    let items = vec![
        WorkItem::RawBody {
            body: body.to_vec(),
            base: Some(Url::parse("https://e.com/").unwrap()),
        },
        WorkItem::RawBody {
            body: body.to_vec(),
            base: None,
        },
    ];
    let (summary, results) = collect(&runner, items).await;

    assert_eq!(summary.failed, 0);
    assert_eq!(
        results.into_iter().collect::<HashSet<_>>(),
        set(&["https://e.com/mod.js", "/mod.js"])
    );
}
