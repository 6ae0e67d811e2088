//! Outer panic boundary.
//!
//! Catches panics raised outside a route's timeout guard (earlier middleware, extractors,
//! the error pipeline itself) and turns them into a critical `INTERNAL_ERROR` response.

use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response};
use contacthub_core::AppError;
use tokio::task::JoinError;

use crate::metrics;
use crate::middleware::context::RequestScope;
use crate::middleware::error_pipeline;
use crate::security_event;

pub async fn panic_recovery(req: Request, next: Next) -> Response {
    let scope = req.extensions().get::<Arc<RequestScope>>().cloned();

    match tokio::spawn(next.run(req)).await {
        Ok(response) => response,
        Err(join_err) => {
            let detail = panic_message(join_err);
            let request_id = scope.as_ref().map(|s| s.request_id.as_str()).unwrap_or_default();
            let path = scope.as_ref().map(|s| s.path.as_str()).unwrap_or_default();
            let method = scope.as_ref().map(|s| s.method.as_str()).unwrap_or_default();
            let ip = scope.as_ref().map(|s| s.ip.as_str()).unwrap_or_default();

            tracing::error!(
                request_id,
                path,
                method,
                panic = %detail,
                "PANIC RECOVERED"
            );
            security_event!(
                "panic_recovered",
                boundary = "outer",
                request_id,
                ip,
                path,
                method
            );
            metrics::track_panic("outer");

            error_pipeline::process(AppError::panic(detail), scope.as_deref())
        }
    }
}

/// Text of a panic payload. Non-string payloads and cancellations get a fixed label.
pub fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return "task cancelled".to_string();
    }

    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panic_message_str() {
        let err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
        assert_eq!(panic_message(err), "boom");
    }

    #[tokio::test]
    async fn test_panic_message_formatted() {
        let id = 7;
        let err = tokio::spawn(async move { panic!("contact {id} missing") })
            .await
            .unwrap_err();
        assert_eq!(panic_message(err), "contact 7 missing");
    }

    #[tokio::test]
    async fn test_cancelled_task() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let err = handle.await.unwrap_err();
        assert_eq!(panic_message(err), "task cancelled");
    }
}
