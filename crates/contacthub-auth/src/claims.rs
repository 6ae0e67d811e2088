//! Claim structures carried by ContactHub credentials.
//!
//! - [`Claims`]: payload of both access and refresh tokens
//! - [`CredentialPair`]: what login and refresh hand back to the client
//! - [`Identity`]: the request-scoped view of an authenticated caller

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT claims shared by access and refresh tokens.
///
/// Immutable once signed. The two token kinds differ only in signing secret, lifetime and
/// the `refresh-` prefix on `jti`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject (account) ID
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiry (Unix timestamp)
    pub exp: i64,
    /// Not-before (Unix timestamp)
    pub nbf: i64,
    pub iss: String,
    /// Unique token ID: `<subject>-<unix>-<random>`
    pub jti: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.sub.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Access and refresh token handed out at login and on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Always `Bearer`
    pub token_type: String,
}

/// Authenticated caller bound to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    pub role: String,
}
