use contacthub_auth::{CredentialPair, Identity};
use contacthub_core::{ErrorBody, ErrorCategory, ErrorCode, ErrorEnvelope, ErrorSeverity, FieldError};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::admin::controller::PolicyResponse;
use crate::modules::auth::model::{
    AccountProfile, LoginRequest, LoginResponse, MessageResponse, PermissionsResponse,
    RefreshTokenRequest,
};
use crate::modules::health::controller::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::validate_token,
        crate::modules::auth::controller::get_permissions,
        crate::modules::admin::controller::get_policy,
        crate::modules::health::controller::health_check,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            AccountProfile,
            CredentialPair,
            Identity,
            PermissionsResponse,
            MessageResponse,
            PolicyResponse,
            HealthResponse,
            ErrorEnvelope,
            ErrorBody,
            FieldError,
            ErrorCode,
            ErrorCategory,
            ErrorSeverity,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Credential issuance, rotation and validation"),
        (name = "Admin", description = "Administrative endpoints"),
        (name = "Health", description = "Liveness")
    ),
    info(
        title = "ContactHub API",
        version = "0.1.0",
        description = "Contact management API. Every failure is returned as the structured error envelope."
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
