//! `GET /`: simulated work, then one counter increment and one latency
//! observation.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::Html};
use tokio::time::Instant;

use crate::app_state::AppState;
use crate::obs::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

pub const GREETING: &str = "¡Hola desde Rust!";

/// Simulated work per request.
pub const WORK_DELAY: Duration = Duration::from_millis(200);

pub async fn home(State(state): State<AppState>) -> (StatusCode, Html<&'static str>) {
    let started = Instant::now();

    tokio::time::sleep(WORK_DELAY).await;

    let elapsed = started.elapsed();
    let status = StatusCode::OK;

    let metrics = state.metrics();
    metrics.increment_counter(
        HTTP_REQUESTS_TOTAL,
        &[("method", "GET"), ("endpoint", "/"), ("http_status", status.as_str())],
    );
    metrics.observe_duration(
        HTTP_REQUEST_DURATION_SECONDS,
        &[("method", "GET"), ("endpoint", "/")],
        elapsed,
    );

    tracing::debug!(elapsed = ?elapsed, "served /");
    (status, Html(GREETING))
}
