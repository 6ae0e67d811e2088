use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use contacthub_core::ErrorEnvelope;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PolicyResponse {
    /// Role name to its sorted permissions
    pub roles: BTreeMap<String, Vec<String>>,
}

/// The role policy loaded at startup
#[utoipa::path(
    get,
    path = "/api/admin/policy",
    responses(
        (status = 200, description = "Loaded role policy", body = PolicyResponse),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 403, description = "Admin access required", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_policy(State(state): State<AppState>) -> Json<PolicyResponse> {
    let roles = state
        .policy
        .roles()
        .map(|role| (role.to_string(), state.policy.permissions_for(role)))
        .collect();
    Json(PolicyResponse { roles })
}
