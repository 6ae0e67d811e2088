use axum::Json;
use axum::extract::State;
use contacthub_auth::{CredentialPair, Identity};
use contacthub_core::{AppError, ErrorEnvelope};
use tracing::{Instrument, instrument};

use super::model::{
    LoginRequest, LoginResponse, MessageResponse, PermissionsResponse, RefreshTokenRequest,
};
use super::service::AuthService;
use crate::auth_span;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Login and receive a credential pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorEnvelope),
        (status = 401, description = "Invalid credentials", body = ErrorEnvelope),
        (status = 403, description = "Account locked", body = ErrorEnvelope),
        (status = 429, description = "Too many requests", body = ErrorEnvelope)
    ),
    tag = "Authentication"
)]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let span = auth_span!("login", user.email = %dto.email);
    async move { AuthService::login(&state, dto).map(Json) }
        .instrument(span)
        .await
}

/// Exchange a refresh token for a new credential pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Credential pair rotated", body = CredentialPair),
        (status = 401, description = "Refresh token invalid, expired or already used", body = ErrorEnvelope)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<CredentialPair>, AppError> {
    AuthService::refresh(&state, &dto.refresh_token).map(Json)
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Refresh token revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 403, description = "Token belongs to another account", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.subject_id()))]
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(&state, &auth_user, &dto.refresh_token).map(Json)
}

/// Identity carried by the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/validate",
    responses(
        (status = 200, description = "Token is valid", body = Identity),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn validate_token(auth_user: AuthUser) -> Json<Identity> {
    Json(auth_user.identity())
}

/// Permissions of the caller's role; empty for anonymous callers
#[utoipa::path(
    get,
    path = "/api/auth/permissions",
    responses(
        (status = 200, description = "Permissions of the bound role", body = PermissionsResponse)
    ),
    security((), ("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn get_permissions(
    State(state): State<AppState>,
    MaybeAuthUser(claims): MaybeAuthUser,
) -> Json<PermissionsResponse> {
    Json(AuthService::permissions(
        &state,
        claims.as_ref().map(|c| c.role.as_str()),
    ))
}
