//! End-of-chain error orchestration.
//!
//! Handlers and inner layers never write error responses on their own: returning an
//! [`AppError`] registers it in the response extensions ([`RegisteredFailures`]). The
//! [`error_pipeline`] layer picks up the last registered failure and runs [`process`]:
//! enrich with request context, log by severity, count, render once.
//!
//! A rendered response carries the [`ErrorRendered`] marker; outer layers that see it leave
//! the response alone, so a request never gets two error bodies.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use contacthub_core::{AppError, ErrorCode, ErrorSeverity, RegisteredFailures};
use serde_json::{Map, Value};

use crate::metrics;
use crate::middleware::context::RequestScope;

/// Marks a response whose error body was already written by [`process`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorRendered;

pub async fn error_pipeline(req: Request, next: Next) -> Response {
    let scope = req.extensions().get::<Arc<RequestScope>>().cloned();
    let mut response = next.run(req).await;

    if response.extensions().get::<ErrorRendered>().is_some() {
        return response;
    }

    let Some(RegisteredFailures(failures)) = response.extensions_mut().remove::<RegisteredFailures>()
    else {
        return response;
    };

    if failures.len() > 1 {
        tracing::debug!(
            registered = failures.len(),
            "Multiple failures registered; rendering the last"
        );
    }

    match failures.into_iter().last() {
        Some(err) => process(err, scope.as_deref()),
        None => response,
    }
}

/// Enriches, logs, meters and renders `err`. The returned response is final.
pub fn process(mut err: AppError, scope: Option<&RequestScope>) -> Response {
    if let Some(scope) = scope {
        enrich(&mut err, scope);
    }

    log_error(&err);

    let endpoint = scope
        .map(|s| s.route_or_path().to_string())
        .or_else(|| err.endpoint.clone())
        .unwrap_or_default();
    metrics::track_api_error(&err, &endpoint);

    let mut response = err.render();
    response.extensions_mut().insert(ErrorRendered);
    response
}

/// Fills request-derived fields. Values set at the failure site win.
pub fn enrich(err: &mut AppError, scope: &RequestScope) {
    err.request_id
        .get_or_insert_with(|| scope.request_id.clone());
    err.endpoint.get_or_insert_with(|| scope.path.clone());
    err.method.get_or_insert_with(|| scope.method.clone());
    err.ip_address.get_or_insert_with(|| scope.ip.clone());
    if err.user_agent.is_none() {
        err.user_agent = scope.user_agent.clone();
    }

    if let Some(identity) = scope.identity() {
        err.subject_id
            .get_or_insert_with(|| identity.subject_id.clone());
        err.metadata
            .entry("user_role".to_string())
            .or_insert_with(|| Value::from(identity.role.clone()));
    }

    if let Some(query) = &scope.query {
        err.metadata
            .entry("query".to_string())
            .or_insert_with(|| Value::from(query.clone()));
    }
    if let Some(content_type) = &scope.content_type {
        err.metadata
            .entry("content_type".to_string())
            .or_insert_with(|| Value::from(content_type.clone()));
    }
    if let Some(length) = scope.content_length {
        err.metadata
            .entry("content_length".to_string())
            .or_insert_with(|| Value::from(length));
    }
}

/// Prefixes every key so context and metadata cannot collide in a log record.
pub fn flatten_fields(prefix: &str, fields: &BTreeMap<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (format!("{prefix}{key}"), value.clone()))
        .collect()
}

macro_rules! log_app_error {
    ($level:ident, $err:ident, $context:ident, $metadata:ident $(, $($extra:tt)*)?) => {
        tracing::$level!(
            error.code = %$err.code,
            error.category = %$err.category,
            error.severity = %$err.severity,
            http_status = $err.http_status,
            request_id = $err.request_id.as_deref().unwrap_or_default(),
            endpoint = $err.endpoint.as_deref().unwrap_or_default(),
            method = $err.method.as_deref().unwrap_or_default(),
            ip = $err.ip_address.as_deref().unwrap_or_default(),
            user_agent = $err.user_agent.as_deref().unwrap_or_default(),
            subject_id = $err.subject_id.as_deref().unwrap_or_default(),
            field_errors = $err.field_errors.len(),
            context = %$context,
            metadata = %$metadata,
            $($($extra)*,)?
            "{}",
            $err.message
        )
    };
}

fn log_error(err: &AppError) {
    let context = Value::Object(flatten_fields("ctx_", &err.context));
    let metadata = Value::Object(flatten_fields("meta_", &err.metadata));

    match err.severity {
        ErrorSeverity::Critical | ErrorSeverity::High => {
            log_app_error!(error, err, context, metadata, diagnostic = %err.diagnostic)
        }
        ErrorSeverity::Medium => log_app_error!(warn, err, context, metadata),
        ErrorSeverity::Low => log_app_error!(info, err, context, metadata),
    }
}

/// Fallback for unmatched routes, so they get the same envelope.
pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::new(ErrorCode::NotFound, "Route not found").with_context("path", uri.path())
}

/// Fallback for a known route called with an unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::bad_request("Method not allowed")
        .with_http_status(StatusCode::METHOD_NOT_ALLOWED)
        .with_context("path", uri.path())
        .with_context("method", method.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use contacthub_auth::Identity;

    fn scope() -> RequestScope {
        let req = Request::builder()
            .method("GET")
            .uri("/api/contacts?page=2")
            .header("user-agent", "test-agent")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        RequestScope::from_request(&req)
    }

    #[test]
    fn test_flatten_prefixes_keys() {
        let mut fields = BTreeMap::new();
        fields.insert("operation".to_string(), Value::from("GET /slow"));
        fields.insert("timeout".to_string(), Value::from("2s"));

        let flat = flatten_fields("ctx_", &fields);
        assert_eq!(flat["ctx_operation"], "GET /slow");
        assert_eq!(flat["ctx_timeout"], "2s");
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn test_enrich_fills_request_fields() {
        let scope = scope();
        scope.bind_identity(Identity {
            subject_id: "user-1".into(),
            email: "a@b.com".into(),
            role: "editor".into(),
        });

        let mut err = AppError::not_found("Contact", 7);
        enrich(&mut err, &scope);

        assert_eq!(err.request_id.as_deref(), Some(scope.request_id.as_str()));
        assert_eq!(err.endpoint.as_deref(), Some("/api/contacts"));
        assert_eq!(err.method.as_deref(), Some("GET"));
        assert_eq!(err.ip_address.as_deref(), Some("198.51.100.2"));
        assert_eq!(err.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(err.subject_id.as_deref(), Some("user-1"));
        assert_eq!(err.metadata["user_role"], "editor");
        assert_eq!(err.metadata["query"], "page=2");
    }

    #[test]
    fn test_enrich_keeps_failure_site_values() {
        let mut err = AppError::bad_request("bad");
        err.endpoint = Some("/custom".into());
        err.metadata.insert("query".into(), Value::from("kept"));

        enrich(&mut err, &scope());

        assert_eq!(err.endpoint.as_deref(), Some("/custom"));
        assert_eq!(err.metadata["query"], "kept");
    }

    async fn contact_exists() -> AppError {
        AppError::new(ErrorCode::ContactExists, "Contact already exists")
    }

    #[test]
    fn test_rendered_error_is_counted_once() {
        use axum::{Router, routing::get};
        use contacthub_config::CorsConfig;
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};
        use tower::ServiceExt;

        crate::metrics::enable_for_tests();
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let app = crate::router::with_request_pipeline(
            Router::new().route("/conflict", get(contact_exists)),
            &CorsConfig {
                allowed_origins: vec![],
            },
        );

        let status = ::metrics::with_local_recorder(&recorder, || {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(async {
                    let request = Request::builder()
                        .uri("/conflict")
                        .body(Body::empty())
                        .unwrap();
                    app.oneshot(request).await.unwrap().status()
                })
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let counted: Vec<_> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| key.key().name() == "api_errors_total")
            .collect();
        assert_eq!(counted.len(), 1);

        let (key, _, _, value) = &counted[0];
        assert!(matches!(value, DebugValue::Counter(1)), "{value:?}");
        let labels: BTreeMap<String, String> = key
            .key()
            .labels()
            .map(|label| (label.key().to_string(), label.value().to_string()))
            .collect();
        assert_eq!(labels["code"], "CONTACT_ALREADY_EXISTS");
        assert_eq!(labels["category"], "business");
        assert_eq!(labels["severity"], "medium");
        assert_eq!(labels["endpoint"], "/conflict");
        assert_eq!(labels["method"], "GET");
    }

    #[test]
    fn test_process_marks_and_renders() {
        let scope = scope();
        let response = process(AppError::rate_limited(std::time::Duration::from_secs(3)), Some(&scope));

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3");
        assert!(response.extensions().get::<ErrorRendered>().is_some());
        assert!(response.extensions().get::<RegisteredFailures>().is_none());
    }
}
