use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use contacthub_auth::TokenKind;
use contacthub_core::AppError;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether `init_metrics` installed a recorder. False until it runs.
pub fn is_observability_enabled() -> bool {
    OBSERVABILITY_ENABLED.get().copied().unwrap_or(false)
}

#[cfg(test)]
pub(crate) fn enable_for_tests() {
    let _ = OBSERVABILITY_ENABLED.set(true);
}

/// Initialize Prometheus metrics exporter with upkeep task
/// Returns None if observability is disabled
pub fn init_metrics(enabled: bool) -> anyhow::Result<Option<PrometheusHandle>> {
    let _ = OBSERVABILITY_ENABLED.set(enabled);
    if !enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )?
        .install_recorder()?;

    // Spawn upkeep task to clean stale metrics
    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router for metrics server
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// One increment per rendered error, tagged by its classification.
pub fn track_api_error(err: &AppError, endpoint: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "api_errors_total",
        "code" => err.code.as_str(),
        "category" => err.category.as_str(),
        "severity" => err.severity.as_str(),
        "endpoint" => endpoint.to_string(),
        "method" => err.method.clone().unwrap_or_default()
    )
    .increment(1);
}

pub fn track_token_issued(kind: TokenKind) {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total", "kind" => kind.as_str()).increment(1);
}

pub fn track_jwt_validation(status: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_validations_total", "status" => status).increment(1);
}

pub fn track_authorization_check(allowed: bool, role: &str) {
    if !is_observability_enabled() {
        return;
    }
    let status = if allowed { "allowed" } else { "denied" };
    counter!("authorization_checks_total", "role" => role.to_string(), "status" => status)
        .increment(1);
}

pub fn track_panic(boundary: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("panics_recovered_total", "boundary" => boundary).increment(1);
}

pub fn track_timeout(endpoint: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("request_timeouts_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn track_rate_limited(scope: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("rate_limited_total", "scope" => scope).increment(1);
}
