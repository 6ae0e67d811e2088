//! Per-route deadline with panic containment.
//!
//! The handler runs as its own task and races the route's deadline. Exactly one outcome
//! produces the response:
//!
//! - completion: the handler's response, untouched
//! - panic: a critical `INTERNAL_ERROR`
//! - deadline: a retryable `TIMEOUT` whose `retry_after` is the route's limit
//!
//! On deadline the task handle is dropped, which detaches the handler rather than aborting
//! it. Work it started downstream may still finish; only the client response is settled.

use std::time::Duration;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use contacthub_core::AppError;

use crate::metrics;
use crate::middleware::recovery::panic_message;
use crate::security_event;

/// Deadline applied to every route of a group.
#[derive(Debug, Clone, Copy)]
pub struct RouteTimeout(pub Duration);

pub async fn timeout_guard(
    State(RouteTimeout(limit)): State<RouteTimeout>,
    req: Request,
    next: Next,
) -> Response {
    let operation = format!("{} {}", req.method(), req.uri().path());
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let handler = tokio::spawn(next.run(req));

    match tokio::time::timeout(limit, handler).await {
        Ok(Ok(response)) => response,
        Ok(Err(join_err)) => {
            let detail = panic_message(join_err);
            security_event!(
                "panic_recovered",
                boundary = "timeout_guard",
                operation = %operation
            );
            metrics::track_panic("timeout_guard");
            AppError::panic(detail).into_response()
        }
        Err(_) => {
            tracing::warn!(
                operation = %operation,
                timeout_ms = limit.as_millis() as u64,
                "Request deadline exceeded"
            );
            metrics::track_timeout(&endpoint);
            AppError::timeout(&operation, limit).into_response()
        }
    }
}
