//! # ContactHub Core
//!
//! Error taxonomy, classification and shared utilities for the ContactHub API.
//!
//! - [`codes`]: the closed set of error codes and their `(status, severity, category)` class
//! - [`errors`]: [`AppError`], the structured error, and its JSON envelope
//! - [`classify`]: normalization of arbitrary failures into [`AppError`]
//! - [`validation`]: field-level errors from `validator`
//! - [`auth`]: credential failure types shared with `contacthub-auth`
//! - [`permissions`]: role and permission names
//! - [`password`]: bcrypt hashing helpers
//!
//! # Example
//!
//! ```ignore
//! use contacthub_core::{AppError, ErrorCode};
//!
//! async fn load(id: Uuid) -> Result<Contact, AppError> {
//!     let contact = repo.find(id).await?; // classified on the way out
//!     contact.ok_or_else(|| AppError::new(ErrorCode::ContactNotFound, "Contact not found"))
//! }
//! ```

pub mod auth;
pub mod classify;
pub mod codes;
pub mod errors;
pub mod password;
pub mod permissions;
pub mod validation;

pub use auth::{HeaderError, TokenError};
pub use classify::classify;
pub use codes::{ErrorCategory, ErrorClass, ErrorCode, ErrorSeverity};
pub use errors::{AppError, ErrorBody, ErrorEnvelope, FieldError, RegisteredFailures};
pub use password::{hash_password, verify_password};
