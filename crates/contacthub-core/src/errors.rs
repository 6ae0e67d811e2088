//! Structured application errors.
//!
//! [`AppError`] is the normalized shape of every failure the API can report. It is built at
//! the failure site (or produced by [`crate::classify`]), enriched with request context while
//! it travels back through the middleware stack, and finally rendered as the JSON envelope
//! described by [`ErrorEnvelope`].
//!
//! The diagnostic payload (`source`, caller location, free-form detail) is never serialized;
//! it only reaches the logs.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::classify::classify;
use crate::codes::{ErrorCategory, ErrorClass, ErrorCode, ErrorSeverity};

/// A single failing field from a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    /// Validation rule that failed (`required`, `email`, `length`, ...).
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub value: Option<Value>,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// Internal diagnostics. Logged, never transmitted.
#[derive(Clone)]
pub struct Diagnostic {
    pub source: Option<Arc<anyhow::Error>>,
    pub location: &'static Location<'static>,
    pub detail: Option<String>,
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostic")
            .field("source", &self.source.as_ref().map(|e| format!("{e:#}")))
            .field("location", &format_args!("{}", self.location))
            .field("detail", &self.detail)
            .finish()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}", self.location)?;
        if let Some(source) = &self.source {
            write!(f, ": {source:#}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Structured application error.
#[derive(Debug, Clone)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub http_status: u16,
    pub context: BTreeMap<String, Value>,
    pub metadata: BTreeMap<String, Value>,
    pub field_errors: Vec<FieldError>,
    pub retryable: bool,
    pub retry_after: Option<Duration>,
    pub request_id: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub subject_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub diagnostic: Diagnostic,
}

impl AppError {
    /// Creates an error whose severity, category and status come from the code's class.
    #[track_caller]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let ErrorClass {
            http_status,
            severity,
            category,
        } = code.class();

        Self {
            code,
            message: message.into(),
            category,
            severity,
            http_status,
            context: BTreeMap::new(),
            metadata: BTreeMap::new(),
            field_errors: Vec::new(),
            retryable: code.is_retryable(),
            retry_after: None,
            request_id: None,
            endpoint: None,
            method: None,
            ip_address: None,
            user_agent: None,
            subject_id: None,
            timestamp: Utc::now(),
            diagnostic: Diagnostic {
                source: None,
                location: Location::caller(),
                detail: None,
            },
        }
    }

    /// Creates an error that keeps `source` in the diagnostic payload only.
    #[track_caller]
    pub fn with_source<E>(code: ErrorCode, message: impl Into<String>, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        let mut err = Self::new(code, message);
        err.diagnostic.source = Some(Arc::new(source.into()));
        err
    }

    #[track_caller]
    pub fn validation(message: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        let mut err = Self::new(ErrorCode::Validation, message);
        err.field_errors = field_errors;
        err
    }

    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            "Authentication required".to_string()
        } else {
            message
        };
        Self::new(ErrorCode::Unauthorized, message)
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            "Access forbidden".to_string()
        } else {
            message
        };
        Self::new(ErrorCode::Forbidden, message)
    }

    #[track_caller]
    pub fn not_found(resource: &str, identifier: impl Into<Value>) -> Self {
        Self::new(ErrorCode::NotFound, format!("{resource} not found"))
            .with_context("resource", resource)
            .with_context("identifier", identifier)
    }

    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Generic internal failure. The client only ever sees `message`.
    #[track_caller]
    pub fn internal<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        let message = message.into();
        let message = if message.is_empty() {
            "Internal server error".to_string()
        } else {
            message
        };
        Self::with_source(ErrorCode::Internal, message, source)
    }

    #[track_caller]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    #[track_caller]
    pub fn database<E>(operation: &str, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::with_source(
            ErrorCode::DatabaseQuery,
            format!("Database operation failed: {operation}"),
            source,
        )
        .with_context("operation", operation)
    }

    /// Deadline exceeded for `operation`; retryable after `limit`.
    #[track_caller]
    pub fn timeout(operation: &str, limit: Duration) -> Self {
        Self::new(ErrorCode::Timeout, format!("Operation timed out: {operation}"))
            .with_context("operation", operation)
            .with_context("timeout", format_duration(limit))
            .with_retry(Some(limit))
    }

    #[track_caller]
    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::new(ErrorCode::RateLimit, "Rate limit exceeded").with_retry(Some(retry_after))
    }

    /// A recovered panic: internal, critical, with the panic text kept out of the response.
    #[track_caller]
    pub fn panic(detail: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorCode::Internal, "System panic occurred")
            .escalate(ErrorSeverity::Critical);
        err.diagnostic.detail = Some(detail.into());
        err
    }

    /// Converts an arbitrary failure through the classifier.
    pub fn classify<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        classify(err.into())
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_field_error(mut self, field_error: FieldError) -> Self {
        self.field_errors.push(field_error);
        self
    }

    pub fn with_retry(mut self, retry_after: Option<Duration>) -> Self {
        self.retryable = true;
        self.retry_after = retry_after;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.diagnostic.detail = Some(detail.into());
        self
    }

    /// Overrides the HTTP status derived from the code, for transport-level failures the
    /// taxonomy has no dedicated code for.
    pub fn with_http_status(mut self, status: axum::http::StatusCode) -> Self {
        self.http_status = status.as_u16();
        self
    }

    /// Raises severity to `severity`. Never lowers it.
    pub fn escalate(mut self, severity: ErrorSeverity) -> Self {
        if severity > self.severity {
            self.severity = severity;
        }
        self
    }

    pub fn status(&self) -> axum::http::StatusCode {
        ErrorClass::new(self.http_status, self.severity, self.category).status_code()
    }

    /// Seconds for the `Retry-After` header, rounded up.
    pub fn retry_after_secs(&self) -> Option<u64> {
        if !self.retryable {
            return None;
        }
        self.retry_after
            .map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0))
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.code,
                message: self.message.clone(),
                category: self.category,
                severity: self.severity,
                http_status: self.http_status,
                context: self.context.clone(),
                field_errors: self.field_errors.clone(),
                retryable: self.retryable,
                retry_after: self.retry_after.map(format_duration),
                request_id: self.request_id.clone(),
                endpoint: self.endpoint.clone(),
                method: self.method.clone(),
                timestamp: self.timestamp,
            },
            request_id: self.request_id.clone(),
            timestamp: self.timestamp,
            path: self.endpoint.clone(),
            method: self.method.clone(),
        }
    }

    /// Writes the envelope with this error's status and retry headers.
    pub fn render(&self) -> Response {
        let mut response = (self.status(), Json(self.to_envelope())).into_response();
        if let Some(secs) = self.retry_after_secs() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Failures registered while a request was handled, oldest first.
///
/// Travels in the response extensions; the error pipeline renders the last one.
#[derive(Debug, Clone, Default)]
pub struct RegisteredFailures(pub Vec<AppError>);

impl RegisteredFailures {
    pub fn push(&mut self, err: AppError) {
        self.0.push(err);
    }

    pub fn last(&self) -> Option<&AppError> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = self.render();
        response
            .extensions_mut()
            .insert(RegisteredFailures(vec![self]));
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        classify(err.into())
    }
}

/// The `error` object of the envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub http_status: u16,
    #[schema(value_type = Object)]
    pub context: BTreeMap<String, Value>,
    pub field_errors: Vec<FieldError>,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// JSON error response written for every failed request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Renders a duration the way it appears in `retry_after`: `2s`, `1500ms`.
pub fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}
