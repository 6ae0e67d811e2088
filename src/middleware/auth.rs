use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use contacthub_auth::{Claims, HeaderError, Identity, extract_bearer};
use contacthub_core::{AppError, TokenError, permissions};

use crate::metrics;
use crate::middleware::context::RequestScope;
use crate::security_event;
use crate::state::AppState;
use crate::utils::tracing::record_user_id;

/// Runs the bearer credential in `headers` through the token service.
///
/// Every rejection is logged as a security event with the request's ip, path and method.
pub fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    scope: Option<&RequestScope>,
) -> Result<Claims, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| HeaderError::MalformedHeader))
        .transpose()
        .and_then(extract_bearer);

    let token = match token {
        Ok(token) => token,
        Err(err) => {
            log_rejection(err.security_event(), &err, scope);
            metrics::track_jwt_validation("missing");
            return Err(err.to_app_error());
        }
    };

    match state.tokens.validate_access(token) {
        Ok(claims) => {
            metrics::track_jwt_validation("valid");
            record_user_id(&claims.sub);
            Ok(claims)
        }
        Err(err) => {
            log_rejection(err.security_event(), &err, scope);
            metrics::track_jwt_validation(match err {
                TokenError::Expired => "expired",
                _ => "invalid",
            });
            Err(err.to_app_error())
        }
    }
}

fn log_rejection(event: &'static str, reason: &dyn std::fmt::Display, scope: Option<&RequestScope>) {
    let (ip, path, method) = scope
        .map(|s| (s.ip.as_str(), s.path.as_str(), s.method.as_str()))
        .unwrap_or_default();
    security_event!(
        event,
        reason = %reason,
        ip,
        path,
        method,
        "Authentication rejected"
    );
}

/// Binds the caller into the request: scope identity plus `Claims` and `Identity` extensions.
fn bind(req: &mut Request, claims: Claims) {
    let identity = claims.identity();
    if let Some(scope) = req.extensions().get::<Arc<RequestScope>>() {
        scope.bind_identity(identity.clone());
    }
    req.extensions_mut().insert(identity);
    req.extensions_mut().insert(claims);
}

/// Aborts with 401 unless the request carries a valid access token.
pub async fn require_authenticated(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let scope = req.extensions().get::<Arc<RequestScope>>().cloned();
    let claims = authenticate(&state, req.headers(), scope.as_deref())?;
    bind(&mut req, claims);
    Ok(next.run(req).await)
}

/// Binds the caller when a valid token is present. Never aborts: a missing or invalid
/// credential leaves the request anonymous.
pub async fn optional_authenticated(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.headers().contains_key(header::AUTHORIZATION) {
        let scope = req.extensions().get::<Arc<RequestScope>>().cloned();
        if let Ok(claims) = authenticate(&state, req.headers(), scope.as_deref()) {
            bind(&mut req, claims);
        }
    }
    next.run(req).await
}

/// Extractor yielding the authenticated caller's claims.
///
/// Reuses what `require_authenticated` bound; otherwise validates the header itself.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn identity(&self) -> Identity {
        self.0.identity()
    }

    pub fn subject_id(&self) -> &str {
        &self.0.sub
    }

    pub fn role(&self) -> &str {
        &self.0.role
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(AuthUser(claims.clone()));
        }

        let scope = parts.extensions.get::<Arc<RequestScope>>().cloned();
        let claims = authenticate(state, &parts.headers, scope.as_deref())?;
        if let Some(scope) = &scope {
            scope.bind_identity(claims.identity());
        }
        parts.extensions.insert(claims.identity());
        parts.extensions.insert(claims.clone());
        Ok(AuthUser(claims))
    }
}

/// Anonymous-friendly counterpart of [`AuthUser`].
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Claims>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(MaybeAuthUser(Some(claims.clone())));
        }
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state)
                .await
                .ok()
                .map(|AuthUser(claims)| claims),
        ))
    }
}

/// Generates an extractor that authenticates and then checks one permission.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = $crate::contacthub_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;

                $crate::middleware::role::check_permission(
                    &state.policy,
                    &auth_user.identity(),
                    $permission,
                )?;

                Ok($name(auth_user))
            }
        }
    };
}

// Contacts
require_permission!(RequireContactsRead, permissions::CONTACTS_READ);
require_permission!(RequireContactsWrite, permissions::CONTACTS_WRITE);
require_permission!(RequireContactsUpdate, permissions::CONTACTS_UPDATE);
require_permission!(RequireContactsAssign, permissions::CONTACTS_ASSIGN);

// Activities
require_permission!(RequireActivitiesRead, permissions::ACTIVITIES_READ);
require_permission!(RequireActivitiesWrite, permissions::ACTIVITIES_WRITE);

// Analytics and bulk
require_permission!(RequireAnalyticsRead, permissions::ANALYTICS_READ);
require_permission!(RequireBulkWrite, permissions::BULK_WRITE);
