use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::context::request_context;
use crate::middleware::error_pipeline::{error_pipeline, method_not_allowed, route_not_found};
use crate::middleware::recovery::panic_recovery;
use crate::modules::admin::init_admin_router;
use crate::modules::auth::init_auth_router;
use crate::modules::health::health_check;
use crate::state::AppState;
use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, middleware, routing::get};
use contacthub_config::CorsConfig;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", init_auth_router(&state))
        .nest("/admin", init_admin_router(&state));

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api", api)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .with_state(state.clone());

    with_request_pipeline(app, &state.config.cors)
}

/// Wraps `router` in the shared request pipeline, outermost first:
///
/// ```text
/// request_context → panic_recovery → logging → metrics → error_pipeline → CORS → routes
/// ```
///
/// Route groups add their own timeout, authentication and rate-limit layers.
pub fn with_request_pipeline(router: Router, cors: &CorsConfig) -> Router {
    router
        .layer(cors_layer(cors))
        .layer(middleware::from_fn(error_pipeline))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(panic_recovery))
        .layer(middleware::from_fn(request_context))
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::RETRY_AFTER])
        .allow_credentials(true)
}
