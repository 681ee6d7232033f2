//! End-to-end checks of the two routes, driven in-process through the router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use futures_util::future::join_all;
use tower::ServiceExt;

use hola_core::exposition::{self, find_value, Sample};
use hola_server::{app_state::AppState, router::build_router, LISTEN};

const COUNTER: &str = "http_requests_total";
const COUNTER_LABELS: [(&str, &str); 3] = [("method", "GET"), ("endpoint", "/"), ("http_status", "200")];
const HIST_LABELS: [(&str, &str); 2] = [("method", "GET"), ("endpoint", "/")];

fn app() -> Router {
    let state = AppState::new().unwrap();
    build_router(state)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn scrape(app: &Router) -> Vec<Sample> {
    let (status, _, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    exposition::parse(&body).unwrap()
}

#[tokio::test]
async fn home_returns_greeting() {
    let app = app();
    let (status, content_type, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.is_empty());
    assert!(body.contains("Hola"));
    assert!(content_type.unwrap().starts_with("text/html"));
}

#[tokio::test]
async fn metrics_content_type() {
    let app = app();
    let (status, content_type, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain; version=0.0.4"));
}

#[tokio::test]
async fn fresh_registry_has_no_series() {
    let app = app();
    let samples = scrape(&app).await;
    assert!(samples.is_empty());
}

#[tokio::test]
async fn counter_and_histogram_track_requests() {
    let app = app();
    let n = 3;
    for _ in 0..n {
        let (status, _, _) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    let samples = scrape(&app).await;
    assert_eq!(find_value(&samples, COUNTER, &COUNTER_LABELS), Some(n as f64));

    let count = find_value(&samples, "http_request_duration_seconds_count", &HIST_LABELS);
    assert_eq!(count, Some(n as f64));

    let sum = find_value(&samples, "http_request_duration_seconds_sum", &HIST_LABELS).unwrap();
    assert!(sum >= n as f64 * 0.2, "sum {sum} below simulated work");

    // every observation is >= 0.2s, so the 0.1 bucket stays empty and +Inf holds all
    let mut le_01 = HIST_LABELS.to_vec();
    le_01.push(("le", "0.1"));
    assert_eq!(find_value(&samples, "http_request_duration_seconds_bucket", &le_01), Some(0.0));
    let mut le_inf = HIST_LABELS.to_vec();
    le_inf.push(("le", "+Inf"));
    assert_eq!(find_value(&samples, "http_request_duration_seconds_bucket", &le_inf), Some(n as f64));

    // histogram series carry no status label
    assert!(samples
        .iter()
        .filter(|s| s.name.starts_with("http_request_duration_seconds"))
        .all(|s| s.label("http_status").is_none()));
}

#[tokio::test]
async fn scraping_is_read_only() {
    let app = app();
    get(&app, "/").await;

    let first = scrape(&app).await;
    let second = scrape(&app).await;
    assert_eq!(first, second);
    assert_eq!(find_value(&second, COUNTER, &COUNTER_LABELS), Some(1.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_lose_no_updates() {
    let app = app();
    let calls = (0..50).map(|_| get(&app, "/"));
    let results = join_all(calls).await;
    assert!(results.iter().all(|(status, _, _)| *status == StatusCode::OK));

    let samples = scrape(&app).await;
    assert_eq!(find_value(&samples, COUNTER, &COUNTER_LABELS), Some(50.0));
    assert_eq!(
        find_value(&samples, "http_request_duration_seconds_count", &HIST_LABELS),
        Some(50.0)
    );
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = app();
    let (status, _, _) = get(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let samples = scrape(&app).await;
    assert_eq!(find_value(&samples, COUNTER, &COUNTER_LABELS), None);
}

#[test]
fn listens_on_all_interfaces_port_5000() {
    let addr: std::net::SocketAddr = LISTEN.parse().unwrap();
    assert!(addr.ip().is_unspecified());
    assert_eq!(addr.port(), 5000);
}
