//! Request pipeline middleware and extractors.
//!
//! # Modules
//!
//! - [`context`]: per-request [`context::RequestScope`] and `X-Request-ID`
//! - [`auth`]: bearer authentication middleware and extractors
//! - [`role`]: role and permission gates
//! - [`rate_limit`]: per-client token buckets
//! - [`timeout`]: per-route deadline with panic containment
//! - [`recovery`]: outer panic boundary
//! - [`error_pipeline`]: enrich, log, count and render registered failures
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireContactsAssign};
//!
//! // Any valid access token
//! async fn me(auth_user: AuthUser) -> Json<Identity> {
//!     Json(auth_user.identity())
//! }
//!
//! // Only callers whose role grants "contacts:assign"
//! async fn assign(RequireContactsAssign(auth_user): RequireContactsAssign) -> StatusCode {
//!     // ...
//! }
//! ```

pub mod auth;
pub mod context;
pub mod error_pipeline;
pub mod rate_limit;
pub mod recovery;
pub mod role;
pub mod timeout;
