//! The closed error taxonomy.
//!
//! Every [`ErrorCode`] maps to exactly one [`ErrorClass`] (HTTP status, severity and
//! category). The mapping is a pure function of the code: it never looks at the message,
//! the request or any runtime state, so the same code always renders and meters the same way.
//!
//! | Code family | HTTP | Severity | Category |
//! |---|---|---|---|
//! | Validation, BadRequest | 400 | low | validation |
//! | Unauthorized, InvalidToken, TokenExpired, InvalidCredentials, auth header errors | 401 | medium | security |
//! | Forbidden, InsufficientRole, AdminRequired, InsufficientPermissions, InvalidPermission | 403 | medium | security |
//! | AccountLocked | 403 | critical | security |
//! | NotFound, ContactNotFound, AppointmentNotFound | 404 | low | business |
//! | Conflict, ContactExists, SchedulingConflict | 409 | medium | business |
//! | InvalidStatus | 422 | low | business |
//! | AssignmentFailed | 500 | medium | business |
//! | RateLimit | 429 | medium | system |
//! | Timeout | 408 | medium | system |
//! | DatabaseConnection, DatabaseTransaction | 500 | high | database |
//! | DatabaseQuery, DatabaseConstraint | 500 | medium | database |
//! | Email/Calendar/File/Notification service | 502 | medium | integration |
//! | Internal | 500 | medium | system |

use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes. Serialized as SCREAMING_SNAKE_CASE strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ErrorCode {
    // General
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "FORBIDDEN")]
    Forbidden,
    #[serde(rename = "CONFLICT")]
    Conflict,
    #[serde(rename = "RATE_LIMIT_EXCEEDED")]
    RateLimit,
    #[serde(rename = "TIMEOUT")]
    Timeout,
    #[serde(rename = "BAD_REQUEST")]
    BadRequest,

    // Database
    #[serde(rename = "DATABASE_CONNECTION_ERROR")]
    DatabaseConnection,
    #[serde(rename = "DATABASE_QUERY_ERROR")]
    DatabaseQuery,
    #[serde(rename = "DATABASE_CONSTRAINT_ERROR")]
    DatabaseConstraint,
    #[serde(rename = "DATABASE_TRANSACTION_ERROR")]
    DatabaseTransaction,

    // Business
    #[serde(rename = "CONTACT_NOT_FOUND")]
    ContactNotFound,
    #[serde(rename = "CONTACT_ALREADY_EXISTS")]
    ContactExists,
    #[serde(rename = "INVALID_STATUS_TRANSITION")]
    InvalidStatus,
    #[serde(rename = "ASSIGNMENT_FAILED")]
    AssignmentFailed,
    #[serde(rename = "SCHEDULING_CONFLICT")]
    SchedulingConflict,
    #[serde(rename = "APPOINTMENT_NOT_FOUND")]
    AppointmentNotFound,
    #[serde(rename = "INVALID_PERMISSION")]
    InvalidPermission,

    // External services
    #[serde(rename = "EMAIL_SERVICE_ERROR")]
    EmailService,
    #[serde(rename = "CALENDAR_SERVICE_ERROR")]
    CalendarService,
    #[serde(rename = "FILE_SERVICE_ERROR")]
    FileService,
    #[serde(rename = "NOTIFICATION_SERVICE_ERROR")]
    NotificationService,

    // Authentication / authorization
    #[serde(rename = "MISSING_AUTH_HEADER")]
    MissingAuthHeader,
    #[serde(rename = "INVALID_AUTH_HEADER")]
    InvalidAuthHeader,
    #[serde(rename = "INVALID_TOKEN")]
    InvalidToken,
    #[serde(rename = "TOKEN_EXPIRED")]
    TokenExpired,
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials,
    #[serde(rename = "ACCOUNT_LOCKED")]
    AccountLocked,
    #[serde(rename = "INSUFFICIENT_ROLE")]
    InsufficientRole,
    #[serde(rename = "ADMIN_REQUIRED")]
    AdminRequired,
    #[serde(rename = "INSUFFICIENT_PERMISSIONS")]
    InsufficientPermissions,
}

impl ErrorCode {
    /// Every code in the taxonomy.
    pub const ALL: [ErrorCode; 33] = [
        ErrorCode::Internal,
        ErrorCode::Validation,
        ErrorCode::NotFound,
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::Conflict,
        ErrorCode::RateLimit,
        ErrorCode::Timeout,
        ErrorCode::BadRequest,
        ErrorCode::DatabaseConnection,
        ErrorCode::DatabaseQuery,
        ErrorCode::DatabaseConstraint,
        ErrorCode::DatabaseTransaction,
        ErrorCode::ContactNotFound,
        ErrorCode::ContactExists,
        ErrorCode::InvalidStatus,
        ErrorCode::AssignmentFailed,
        ErrorCode::SchedulingConflict,
        ErrorCode::AppointmentNotFound,
        ErrorCode::InvalidPermission,
        ErrorCode::EmailService,
        ErrorCode::CalendarService,
        ErrorCode::FileService,
        ErrorCode::NotificationService,
        ErrorCode::MissingAuthHeader,
        ErrorCode::InvalidAuthHeader,
        ErrorCode::InvalidToken,
        ErrorCode::TokenExpired,
        ErrorCode::InvalidCredentials,
        ErrorCode::AccountLocked,
        ErrorCode::InsufficientRole,
        ErrorCode::AdminRequired,
        ErrorCode::InsufficientPermissions,
    ];

    /// Wire name of the code, e.g. `"TOKEN_EXPIRED"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Internal => "INTERNAL_ERROR",
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::RateLimit => "RATE_LIMIT_EXCEEDED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::DatabaseConnection => "DATABASE_CONNECTION_ERROR",
            ErrorCode::DatabaseQuery => "DATABASE_QUERY_ERROR",
            ErrorCode::DatabaseConstraint => "DATABASE_CONSTRAINT_ERROR",
            ErrorCode::DatabaseTransaction => "DATABASE_TRANSACTION_ERROR",
            ErrorCode::ContactNotFound => "CONTACT_NOT_FOUND",
            ErrorCode::ContactExists => "CONTACT_ALREADY_EXISTS",
            ErrorCode::InvalidStatus => "INVALID_STATUS_TRANSITION",
            ErrorCode::AssignmentFailed => "ASSIGNMENT_FAILED",
            ErrorCode::SchedulingConflict => "SCHEDULING_CONFLICT",
            ErrorCode::AppointmentNotFound => "APPOINTMENT_NOT_FOUND",
            ErrorCode::InvalidPermission => "INVALID_PERMISSION",
            ErrorCode::EmailService => "EMAIL_SERVICE_ERROR",
            ErrorCode::CalendarService => "CALENDAR_SERVICE_ERROR",
            ErrorCode::FileService => "FILE_SERVICE_ERROR",
            ErrorCode::NotificationService => "NOTIFICATION_SERVICE_ERROR",
            ErrorCode::MissingAuthHeader => "MISSING_AUTH_HEADER",
            ErrorCode::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::AccountLocked => "ACCOUNT_LOCKED",
            ErrorCode::InsufficientRole => "INSUFFICIENT_ROLE",
            ErrorCode::AdminRequired => "ADMIN_REQUIRED",
            ErrorCode::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
        }
    }

    /// Default classification of this code.
    pub const fn class(self) -> ErrorClass {
        use ErrorCategory as C;
        use ErrorSeverity as S;

        match self {
            ErrorCode::Validation | ErrorCode::BadRequest => {
                ErrorClass::new(400, S::Low, C::Validation)
            }

            ErrorCode::Unauthorized
            | ErrorCode::MissingAuthHeader
            | ErrorCode::InvalidAuthHeader
            | ErrorCode::InvalidToken
            | ErrorCode::TokenExpired
            | ErrorCode::InvalidCredentials => ErrorClass::new(401, S::Medium, C::Security),

            ErrorCode::Forbidden
            | ErrorCode::InsufficientRole
            | ErrorCode::AdminRequired
            | ErrorCode::InsufficientPermissions
            | ErrorCode::InvalidPermission => ErrorClass::new(403, S::Medium, C::Security),
            ErrorCode::AccountLocked => ErrorClass::new(403, S::Critical, C::Security),

            ErrorCode::NotFound | ErrorCode::ContactNotFound | ErrorCode::AppointmentNotFound => {
                ErrorClass::new(404, S::Low, C::Business)
            }
            ErrorCode::Conflict | ErrorCode::ContactExists | ErrorCode::SchedulingConflict => {
                ErrorClass::new(409, S::Medium, C::Business)
            }
            ErrorCode::InvalidStatus => ErrorClass::new(422, S::Low, C::Business),
            ErrorCode::AssignmentFailed => ErrorClass::new(500, S::Medium, C::Business),

            ErrorCode::RateLimit => ErrorClass::new(429, S::Medium, C::System),
            ErrorCode::Timeout => ErrorClass::new(408, S::Medium, C::System),

            ErrorCode::DatabaseConnection | ErrorCode::DatabaseTransaction => {
                ErrorClass::new(500, S::High, C::Database)
            }
            ErrorCode::DatabaseQuery | ErrorCode::DatabaseConstraint => {
                ErrorClass::new(500, S::Medium, C::Database)
            }

            ErrorCode::EmailService
            | ErrorCode::CalendarService
            | ErrorCode::FileService
            | ErrorCode::NotificationService => ErrorClass::new(502, S::Medium, C::Integration),

            ErrorCode::Internal => ErrorClass::new(500, S::Medium, C::System),
        }
    }

    /// Whether clients may retry a failure with this code.
    pub const fn is_retryable(self) -> bool {
        matches!(self, ErrorCode::RateLimit | ErrorCode::Timeout)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

/// Returned when parsing a code name that is not part of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

/// Severity axis, drives the log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category axis, used for metrics grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Validation,
    Database,
    Business,
    Security,
    Integration,
    System,
}

impl ErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Database => "database",
            ErrorCategory::Business => "business",
            ErrorCategory::Security => "security",
            ErrorCategory::Integration => "integration",
            ErrorCategory::System => "system",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(status, severity, category)` triple attached to a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClass {
    pub http_status: u16,
    pub severity: ErrorSeverity,
    pub category: ErrorCategory,
}

impl ErrorClass {
    /// Classification used for code names that are not in the taxonomy.
    pub const FALLBACK: ErrorClass =
        ErrorClass::new(500, ErrorSeverity::High, ErrorCategory::System);

    pub const fn new(http_status: u16, severity: ErrorSeverity, category: ErrorCategory) -> Self {
        Self {
            http_status,
            severity,
            category,
        }
    }

    /// Classifies a code by wire name. Unknown names get [`ErrorClass::FALLBACK`].
    pub fn for_code_name(name: &str) -> Self {
        name.parse::<ErrorCode>()
            .map(ErrorCode::class)
            .unwrap_or(Self::FALLBACK)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
