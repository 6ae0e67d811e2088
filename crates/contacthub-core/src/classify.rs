//! Normalizes arbitrary failures into [`AppError`].
//!
//! Signatures are tried in a fixed priority order:
//!
//! 1. an [`AppError`] already carried by the `anyhow::Error` (returned unchanged)
//! 2. `validator::ValidationErrors`
//! 3. [`TokenError`] / [`HeaderError`]
//! 4. `sqlx::Error`
//! 5. `tokio::time::error::Elapsed`
//! 6. message substrings: database family, then timeout family, then not-found family
//! 7. generic `INTERNAL_ERROR`
//!
//! Raw error text never reaches the client message. It is kept in the diagnostic source.

use std::time::Duration;

use sqlx::error::ErrorKind;
use validator::ValidationErrors;

use crate::auth::{HeaderError, TokenError};
use crate::codes::ErrorCode;
use crate::errors::AppError;
use crate::validation::from_validation_errors;

/// Client-facing message for failures that match no known signature.
pub const UNEXPECTED: &str = "An unexpected error occurred";

/// `retry_after` suggested for timeouts recognised by signature rather than by a guard.
pub const DEFAULT_TIMEOUT_RETRY: Duration = Duration::from_secs(30);

const DATABASE_MARKERS: [&str; 5] = ["database", "sql", "connection", "constraint", "transaction"];
const TIMEOUT_MARKERS: [&str; 5] = [
    "timeout",
    "timed out",
    "deadline exceeded",
    "context canceled",
    "cancelled",
];
const NOT_FOUND_MARKERS: [&str; 3] = ["not found", "does not exist", "no rows"];

/// Classifies `err`. Deterministic: the same failure always yields the same code.
#[track_caller]
pub fn classify(err: anyhow::Error) -> AppError {
    if let Some(app_err) = err.downcast_ref::<AppError>() {
        return app_err.clone();
    }

    if let Some(errors) = err.downcast_ref::<ValidationErrors>() {
        return from_validation_errors(errors);
    }

    if let Some(token_err) = err.downcast_ref::<TokenError>() {
        return token_err.to_app_error();
    }

    if let Some(header_err) = err.downcast_ref::<HeaderError>() {
        return header_err.to_app_error();
    }

    if let Some(code) = err.downcast_ref::<sqlx::Error>().map(sqlx_code) {
        return database_error(code, err);
    }

    if err.downcast_ref::<tokio::time::error::Elapsed>().is_some() {
        return timeout_error(err);
    }

    let text = format!("{err:#}").to_lowercase();

    if contains_any(&text, &DATABASE_MARKERS) {
        let code = if text.contains("connection") {
            ErrorCode::DatabaseConnection
        } else if text.contains("constraint") {
            ErrorCode::DatabaseConstraint
        } else if text.contains("transaction") {
            ErrorCode::DatabaseTransaction
        } else {
            ErrorCode::DatabaseQuery
        };
        return database_error(code, err);
    }

    if contains_any(&text, &TIMEOUT_MARKERS) {
        return timeout_error(err);
    }

    if contains_any(&text, &NOT_FOUND_MARKERS) {
        return AppError::with_source(ErrorCode::NotFound, "Resource not found", err);
    }

    AppError::internal(UNEXPECTED, err)
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

fn sqlx_code(err: &sqlx::Error) -> ErrorCode {
    match err {
        sqlx::Error::RowNotFound => ErrorCode::NotFound,
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => ErrorCode::DatabaseConnection,
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => ErrorCode::DatabaseConstraint,
            _ => ErrorCode::DatabaseQuery,
        },
        _ => ErrorCode::DatabaseQuery,
    }
}

#[track_caller]
fn database_error(code: ErrorCode, err: anyhow::Error) -> AppError {
    let message = match code {
        ErrorCode::NotFound => "Record not found",
        ErrorCode::DatabaseConnection => "Database connection error",
        ErrorCode::DatabaseConstraint => "Database constraint violation",
        ErrorCode::DatabaseTransaction => "Database transaction error",
        _ => "Database operation failed",
    };
    AppError::with_source(code, message, err)
}

#[track_caller]
fn timeout_error(err: anyhow::Error) -> AppError {
    AppError::with_source(ErrorCode::Timeout, "Operation timed out", err)
        .with_retry(Some(DEFAULT_TIMEOUT_RETRY))
}

/// Returns the diagnostic source of `err` if it was produced by [`classify`].
pub fn source_text(err: &AppError) -> Option<String> {
    err.diagnostic
        .source
        .as_ref()
        .map(|source| format!("{source:#}"))
}
