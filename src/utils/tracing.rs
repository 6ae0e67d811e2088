//! Tracing helpers and macros shared by the request pipeline.
//!
//! Security events are the structured trail of the authentication and recovery layers. They
//! are emitted at WARN with a `security.event` field so a log sink can route them separately.

use tracing::Span;

/// Create a span for authentication/authorization operations
///
/// # Example
/// ```ignore
/// let span = auth_span!("login", user.email = %email);
/// ```
#[macro_export]
macro_rules! auth_span {
    ($event:expr) => {
        tracing::info_span!(
            "auth",
            auth.event = $event,
            auth.success = tracing::field::Empty,
            user.id = tracing::field::Empty
        )
    };
    ($event:expr, $($field:tt)*) => {
        tracing::info_span!(
            "auth",
            auth.event = $event,
            auth.success = tracing::field::Empty,
            user.id = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Log a security-relevant event at WARN level
///
/// Use this for failed authentication, authorization denials, throttled clients and
/// recovered panics.
#[macro_export]
macro_rules! security_event {
    ($event:expr) => {
        tracing::warn!(security.event = $event)
    };
    ($event:expr, $($field:tt)*) => {
        tracing::warn!(
            security.event = $event,
            $($field)*
        )
    };
}

/// Log an audit event at INFO level
#[macro_export]
macro_rules! audit_event {
    ($action:expr, $resource:expr, $($field:tt)*) => {
        tracing::info!(
            audit.action = $action,
            audit.resource = $resource,
            $($field)*
        )
    };
}

/// Record a subject id on the current span
pub fn record_user_id(user_id: &str) {
    Span::current().record("user.id", user_id);
}

/// Record authentication success/failure on the current span
pub fn record_auth_result(success: bool) {
    Span::current().record("auth.success", success);
}
