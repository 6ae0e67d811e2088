use chrono::Utc;
use contacthub_auth::{CredentialPair, TokenKind};
use contacthub_core::{AppError, ErrorCode, verify_password};

use super::model::{LoginRequest, LoginResponse, MessageResponse, PermissionsResponse};
use crate::metrics;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::tracing::record_auth_result;
use crate::{audit_event, security_event};

/// Consecutive failed logins after which an account is locked.
pub const MAX_FAILED_LOGINS: u32 = 5;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const ACCOUNT_LOCKED: &str = "Account locked due to too many failed login attempts";

pub struct AuthService;

impl AuthService {
    pub fn login(state: &AppState, dto: LoginRequest) -> Result<LoginResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        let Some(account) = state
            .accounts
            .find_by_email(&email)?
            .filter(|a| a.is_active)
        else {
            security_event!("login_failed", email = %email, reason = "user_not_found");
            record_auth_result(false);
            return Err(AppError::new(
                ErrorCode::InvalidCredentials,
                INVALID_CREDENTIALS,
            ));
        };

        if account.failed_attempts >= MAX_FAILED_LOGINS {
            security_event!(
                "login_blocked",
                actor_id = %account.id,
                attempts = account.failed_attempts,
                reason = "too_many_attempts"
            );
            record_auth_result(false);
            return Err(AppError::new(ErrorCode::AccountLocked, ACCOUNT_LOCKED));
        }

        if !verify_password(&dto.password, &account.password_hash)? {
            let attempts = state.accounts.record_failed_login(account.id)?;
            security_event!(
                "login_failed",
                actor_id = %account.id,
                attempts,
                reason = "invalid_password"
            );
            record_auth_result(false);

            if attempts >= MAX_FAILED_LOGINS {
                security_event!(
                    "login_blocked",
                    actor_id = %account.id,
                    attempts,
                    reason = "too_many_attempts"
                );
                return Err(AppError::new(ErrorCode::AccountLocked, ACCOUNT_LOCKED));
            }
            return Err(AppError::new(
                ErrorCode::InvalidCredentials,
                INVALID_CREDENTIALS,
            ));
        }

        let now = Utc::now();
        state.accounts.record_successful_login(account.id, now)?;

        let tokens = state
            .tokens
            .issue_pair(&account.id.to_string(), &account.email, &account.role)?;
        metrics::track_token_issued(TokenKind::Access);
        metrics::track_token_issued(TokenKind::Refresh);
        record_auth_result(true);
        audit_event!("login", "session", actor_id = %account.id, role = %account.role);

        let mut user = account.profile();
        user.last_login_at = Some(now);
        Ok(LoginResponse { user, tokens })
    }

    /// Rotates the pair. The presented refresh token cannot be used again.
    pub fn refresh(state: &AppState, refresh_token: &str) -> Result<CredentialPair, AppError> {
        match state.tokens.refresh_pair(refresh_token) {
            Ok(pair) => {
                security_event!("token_refreshed", "Credential pair rotated");
                metrics::track_token_issued(TokenKind::Access);
                metrics::track_token_issued(TokenKind::Refresh);
                Ok(pair)
            }
            Err(err) => {
                security_event!("token_refresh_failed", reason = %err);
                Err(err.to_app_error())
            }
        }
    }

    /// Revokes the caller's refresh token.
    pub fn logout(
        state: &AppState,
        auth_user: &AuthUser,
        refresh_token: &str,
    ) -> Result<MessageResponse, AppError> {
        let claims = state
            .tokens
            .validate_refresh(refresh_token)
            .map_err(|err| err.to_app_error())?;

        if claims.sub != auth_user.subject_id() {
            security_event!(
                "logout",
                actor_id = %auth_user.subject_id(),
                outcome = "foreign_token"
            );
            return Err(AppError::forbidden(
                "Refresh token does not belong to the caller",
            ));
        }

        state
            .tokens
            .revoke_refresh(refresh_token)
            .map_err(|err| err.to_app_error())?;
        security_event!("logout", actor_id = %auth_user.subject_id(), outcome = "revoked");

        Ok(MessageResponse {
            message: "Logged out successfully".to_string(),
        })
    }

    pub fn permissions(state: &AppState, role: Option<&str>) -> PermissionsResponse {
        PermissionsResponse {
            role: role.map(str::to_string),
            permissions: role
                .map(|r| state.policy.permissions_for(r))
                .unwrap_or_default(),
        }
    }
}
