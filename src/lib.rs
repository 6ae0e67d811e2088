//! # ContactHub API
//!
//! The HTTP surface of a contact management service: authentication, role-based
//! access control and a uniform error pipeline that every failure flows through.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── contacthub-core/    # Error codes, AppError, classifier, validation, permissions
//! ├── contacthub-config/  # Environment-driven configuration
//! ├── contacthub-auth/    # Claims, JWT issuance/validation, revocation, role policy
//! └── contacthub-cli/     # Operator tooling (token minting, policy checks)
//! src/
//! ├── middleware/         # Request context, auth, access gates, timeouts, panics, errors
//! ├── modules/            # Feature modules
//! │   ├── auth/          # Login, refresh, logout, token validation, permissions
//! │   ├── admin/         # Admin-only endpoints
//! │   └── health/        # Liveness
//! └── utils/              # Security/audit event macros
//! ```
//!
//! Each feature module follows the same layout: `controller.rs`, `model.rs`,
//! `router.rs`, and `service.rs` where there is business logic.
//!
//! ## Errors
//!
//! Handlers return [`contacthub_core::AppError`]. Every failure, including
//! extractor rejections, timeouts and panics, is rendered as
//!
//! ```json
//! {
//!   "success": false,
//!   "error": {
//!     "code": "TIMEOUT", "message": "Operation timed out: GET /api/contacts",
//!     "category": "system", "severity": "medium", "http_status": 408,
//!     "context": { "operation": "GET /api/contacts", "timeout": "30s" },
//!     "field_errors": [],
//!     "retryable": true, "retry_after": "30s",
//!     "request_id": "6f1c1c5e-8a43-4d2b-9b47-5bb5a7b0c6f1",
//!     "endpoint": "/api/contacts", "method": "GET",
//!     "timestamp": "2025-01-01T12:00:00Z"
//!   },
//!   "request_id": "6f1c1c5e-8a43-4d2b-9b47-5bb5a7b0c6f1",
//!   "timestamp": "2025-01-01T12:00:00Z",
//!   "path": "/api/contacts",
//!   "method": "GET"
//! }
//! ```
//!
//! Retryable failures also carry a `Retry-After` header in whole seconds.
//!
//! ## Environment
//!
//! ```bash
//! JWT_ACCESS_SECRET=...          # at least 32 bytes
//! JWT_REFRESH_SECRET=...         # at least 32 bytes, distinct from the access secret
//! RBAC_POLICY_PATH=policy.json   # optional, built-in policy otherwise
//! BOOTSTRAP_ADMIN_EMAIL=admin@example.com
//! BOOTSTRAP_ADMIN_PASSWORD_HASH='$2b$12$...'
//! ```
//!
//! ## Modules
//!
//! - [`docs`]: OpenAPI document
//! - [`logging`]: Subscriber setup and request logging
//! - [`metrics`]: Prometheus recorder and counters
//! - [`middleware`]: Request pipeline
//! - [`modules`]: Feature modules
//! - [`router`]: Main application router
//! - [`state`]: Shared application state
//! - [`utils`]: Shared utilities
//! - [`validator`]: Validated JSON extractor

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

// Re-export workspace crates for convenience
pub use contacthub_auth;
pub use contacthub_config;
pub use contacthub_core;
