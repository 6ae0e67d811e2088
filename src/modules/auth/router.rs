use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::controller::{get_permissions, login_user, logout, refresh_token, validate_token};
use crate::middleware::auth::{optional_authenticated, require_authenticated};
use crate::middleware::rate_limit::{RateLimitGate, RateLimitScope, rate_limit};
use crate::middleware::timeout::{RouteTimeout, timeout_guard};
use crate::state::AppState;

/// Routes under `/api/auth`.
///
/// Credential endpoints share the auth deadline and the stricter auth quota.
pub fn init_auth_router(state: &AppState) -> Router<AppState> {
    let auth_timeout = RouteTimeout(state.config.timeouts.auth);
    let auth_limit = RateLimitGate::new(state.limiters.clone(), RateLimitScope::Auth);

    let public = Router::new()
        .route("/login", post(login_user))
        .route("/refresh", post(refresh_token))
        .route_layer(middleware::from_fn_with_state(auth_timeout, timeout_guard));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/validate", get(validate_token))
        .route_layer(middleware::from_fn_with_state(auth_timeout, timeout_guard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ));

    let credentials = public
        .merge(protected)
        .route_layer(middleware::from_fn_with_state(auth_limit, rate_limit));

    let personalized = Router::new()
        .route("/permissions", get(get_permissions))
        .route_layer(middleware::from_fn_with_state(
            RouteTimeout(state.config.timeouts.request),
            timeout_guard,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_authenticated,
        ))
        .route_layer(middleware::from_fn_with_state(
            RateLimitGate::new(state.limiters.clone(), RateLimitScope::General),
            rate_limit,
        ));

    credentials.merge(personalized)
}
