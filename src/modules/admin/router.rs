use axum::{Router, middleware, routing::get};
use contacthub_core::permissions::ROLE_ADMIN;

use super::controller::get_policy;
use crate::middleware::auth::require_authenticated;
use crate::middleware::rate_limit::{RateLimitGate, RateLimitScope, rate_limit};
use crate::middleware::role::{AccessGate, enforce_access};
use crate::middleware::timeout::{RouteTimeout, timeout_guard};
use crate::state::AppState;

/// Admin-only routes under `/api/admin`.
pub fn init_admin_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/policy", get(get_policy))
        .route_layer(middleware::from_fn_with_state(
            RouteTimeout(state.config.timeouts.request),
            timeout_guard,
        ))
        .route_layer(middleware::from_fn_with_state(
            AccessGate::role(state.policy.clone(), ROLE_ADMIN),
            enforce_access,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ))
        .route_layer(middleware::from_fn_with_state(
            RateLimitGate::new(state.limiters.clone(), RateLimitScope::General),
            rate_limit,
        ))
}
