//! Credential failure types.
//!
//! These live in the core crate so the classifier can recognise them; `contacthub-auth`
//! re-exports them alongside the token service that produces them.

use crate::codes::ErrorCode;
use crate::errors::AppError;

/// Why a signed credential was rejected (or could not be minted).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token is malformed")]
    Malformed,
    #[error("token uses an unexpected signing algorithm")]
    WrongAlgorithm,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token has been revoked")]
    Revoked,
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TokenError::Expired => ErrorCode::TokenExpired,
            TokenError::UnknownRole(_) | TokenError::Signing(_) => ErrorCode::Internal,
            _ => ErrorCode::InvalidToken,
        }
    }

    /// Client-safe message. Invalid tokens all read the same.
    pub fn public_message(&self) -> &'static str {
        match self {
            TokenError::Expired => "Token has expired",
            TokenError::UnknownRole(_) | TokenError::Signing(_) => "Failed to issue credentials",
            _ => "Invalid or malformed token",
        }
    }

    /// Security event name logged when this rejection happens at the request gate.
    pub fn security_event(&self) -> &'static str {
        match self {
            TokenError::Expired => "token_expired",
            _ => "invalid_token",
        }
    }

    #[track_caller]
    pub fn to_app_error(&self) -> AppError {
        AppError::with_source(self.code(), self.public_message(), self.clone())
            .with_detail(self.to_string())
    }
}

/// Why the `Authorization` header could not yield a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("authorization header is malformed")]
    MalformedHeader,
    #[error("bearer token is empty")]
    EmptyToken,
}

impl HeaderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HeaderError::MissingHeader => ErrorCode::MissingAuthHeader,
            HeaderError::MalformedHeader | HeaderError::EmptyToken => ErrorCode::InvalidAuthHeader,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            HeaderError::MissingHeader => "Authorization header is required",
            HeaderError::MalformedHeader => {
                "Authorization header must be in format 'Bearer <token>'"
            }
            HeaderError::EmptyToken => "Bearer token cannot be empty",
        }
    }

    pub fn security_event(&self) -> &'static str {
        match self {
            HeaderError::MissingHeader => "missing_auth_header",
            _ => "invalid_auth_header",
        }
    }

    #[track_caller]
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.code(), self.public_message())
    }
}
