//! # ContactHub Auth
//!
//! Credential issuance, validation and role policy for the ContactHub API.
//!
//! - [`claims`]: JWT claims, the credential pair and the request identity
//! - [`jwt`]: [`TokenService`], which issues, validates, rotates and revokes credentials
//! - [`header`]: `Authorization: Bearer` parsing
//! - [`policy`]: the role → permission table
//! - [`revocation`]: single-use refresh tokens
//!
//! # Example
//!
//! ```ignore
//! use contacthub_auth::{extract_bearer, TokenService};
//!
//! let token = extract_bearer(headers.get("authorization").and_then(|v| v.to_str().ok()))?;
//! let claims = service.validate_access(token)?;
//! if service.has_permission(&claims.role, "contacts:read") {
//!     // ...
//! }
//! ```

pub mod claims;
pub mod header;
pub mod jwt;
pub mod policy;
pub mod revocation;

// Re-export commonly used types at crate root
pub use claims::{Claims, CredentialPair, Identity, TokenKind};
pub use contacthub_core::{HeaderError, TokenError};
pub use header::extract_bearer;
pub use jwt::{TokenService, inspect_token, validate_credential};
pub use policy::{PolicyError, RolePolicy};
pub use revocation::{InMemoryRevocationStore, RevocationError, RevocationStore};
