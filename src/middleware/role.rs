//! Post-authentication access gates.
//!
//! Three forms, all sharing the same checks:
//! 1. Layer-based: [`enforce_access`] driven by an [`AccessGate`]
//! 2. Extractor-based: [`RequireAdmin`] and the `require_permission!` extractors
//! 3. Helper functions for checks inside handlers
//!
//! A gate reached without a bound identity answers 401. A denial answers 403 with a generic
//! message; the required role or permission only reaches the security log.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use contacthub_auth::{Identity, RolePolicy};
use contacthub_core::{AppError, ErrorCode, permissions::ROLE_ADMIN};

use crate::metrics;
use crate::middleware::auth::AuthUser;
use crate::middleware::context::RequestScope;
use crate::security_event;
use crate::state::AppState;

pub const PERMISSION_DENIED: &str = "You don't have permission to access this resource";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    Role(String),
    AnyRole(Vec<String>),
    Permission(String),
}

/// State for [`enforce_access`].
///
/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/policy", get(get_policy))
///     .route_layer(middleware::from_fn_with_state(
///         AccessGate::role(state.policy.clone(), "admin"),
///         enforce_access,
///     ))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_authenticated));
/// ```
#[derive(Debug, Clone)]
pub struct AccessGate {
    rule: AccessRule,
    policy: Arc<RolePolicy>,
}

impl AccessGate {
    pub fn role(policy: Arc<RolePolicy>, role: impl Into<String>) -> Self {
        Self {
            rule: AccessRule::Role(role.into()),
            policy,
        }
    }

    pub fn any_role<I, S>(policy: Arc<RolePolicy>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rule: AccessRule::AnyRole(roles.into_iter().map(Into::into).collect()),
            policy,
        }
    }

    pub fn permission(policy: Arc<RolePolicy>, permission: impl Into<String>) -> Self {
        Self {
            rule: AccessRule::Permission(permission.into()),
            policy,
        }
    }

    pub fn rule(&self) -> &AccessRule {
        &self.rule
    }

    pub fn check(&self, identity: Option<&Identity>) -> Result<(), AppError> {
        let Some(identity) = identity else {
            return Err(authentication_required());
        };

        match &self.rule {
            AccessRule::Role(role) => check_role(identity, role),
            AccessRule::AnyRole(roles) => check_any_role(identity, roles),
            AccessRule::Permission(permission) => {
                check_permission(&self.policy, identity, permission)
            }
        }
    }
}

/// Middleware applying an [`AccessGate`] to the identity bound by the authenticator.
pub async fn enforce_access(
    State(gate): State<AccessGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<Identity>().cloned().or_else(|| {
        req.extensions()
            .get::<Arc<RequestScope>>()
            .and_then(|scope| scope.identity().cloned())
    });

    gate.check(identity.as_ref())?;
    Ok(next.run(req).await)
}

/// Extractor for admin-only handlers
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_role(&auth_user.identity(), ROLE_ADMIN)?;
        Ok(RequireAdmin(auth_user))
    }
}

pub fn check_role(identity: &Identity, role: &str) -> Result<(), AppError> {
    check_any_role(identity, &[role])
}

pub fn check_any_role<S: AsRef<str>>(identity: &Identity, allowed: &[S]) -> Result<(), AppError> {
    let granted = allowed.iter().any(|r| r.as_ref() == identity.role);
    metrics::track_authorization_check(granted, &identity.role);
    if granted {
        return Ok(());
    }

    let required: Vec<&str> = allowed.iter().map(AsRef::as_ref).collect();
    security_event!(
        "insufficient_role",
        actor_id = %identity.subject_id,
        role = %identity.role,
        required = ?required,
        "Role check failed"
    );

    if required == [ROLE_ADMIN] {
        Err(AppError::new(ErrorCode::AdminRequired, "Admin access required"))
    } else {
        Err(AppError::new(
            ErrorCode::InsufficientRole,
            "Insufficient role for this resource",
        ))
    }
}

pub fn check_permission(
    policy: &RolePolicy,
    identity: &Identity,
    permission: &str,
) -> Result<(), AppError> {
    let granted = policy.has_permission(&identity.role, permission);
    metrics::track_authorization_check(granted, &identity.role);
    if granted {
        return Ok(());
    }

    security_event!(
        "insufficient_permissions",
        actor_id = %identity.subject_id,
        role = %identity.role,
        permission,
        "Permission check failed"
    );
    Err(AppError::new(
        ErrorCode::InsufficientPermissions,
        PERMISSION_DENIED,
    ))
}

fn authentication_required() -> AppError {
    security_event!("authentication_required", "Access gate reached without identity");
    AppError::unauthorized("Authentication required")
}
