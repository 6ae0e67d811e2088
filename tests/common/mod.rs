#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use contacthub::contacthub_auth::Claims;
use contacthub::contacthub_config::AppConfig;
use contacthub::modules::auth::InMemoryAccountStore;
use contacthub::modules::auth::model::Account;
use contacthub::router::init_router;
use contacthub::state::AppState;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";
pub const ADMIN_EMAIL: &str = "admin@contacthub.test";
pub const EDITOR_EMAIL: &str = "editor@contacthub.test";
pub const WRITER_EMAIL: &str = "writer@contacthub.test";

/// Verification reads the cost from the hash, so a low cost keeps the suite fast.
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Config with generous quotas and no metrics recorder. `overrides` win.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let overrides: Vec<(String, String)> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    AppConfig::from_lookup(move |key| {
        if let Some((_, v)) = overrides.iter().find(|(k, _)| k == key) {
            return Some(v.clone());
        }
        match key {
            "JWT_ACCESS_SECRET" => Some("test-access-secret-0123456789abcdef".to_string()),
            "JWT_REFRESH_SECRET" => Some("test-refresh-secret-0123456789abcdef".to_string()),
            "RATE_LIMIT_GENERAL_PER_SECOND"
            | "RATE_LIMIT_GENERAL_BURST_SIZE"
            | "RATE_LIMIT_AUTH_PER_SECOND"
            | "RATE_LIMIT_AUTH_BURST_SIZE" => Some("1000".to_string()),
            "OBSERVABILITY_ENABLED" => Some("false".to_string()),
            _ => None,
        }
    })
    .expect("test config is valid")
}

pub fn account(email: &str, role: &str) -> Account {
    let hash = bcrypt::hash(PASSWORD, TEST_BCRYPT_COST).expect("hash test password");
    Account::new(email, "Test User", role, hash)
}

pub fn test_state(config: AppConfig) -> AppState {
    let accounts = InMemoryAccountStore::with_accounts([
        account(ADMIN_EMAIL, "admin"),
        account(EDITOR_EMAIL, "editor"),
        account(WRITER_EMAIL, "content_writer"),
    ]);
    AppState::new(config, Arc::new(accounts)).expect("built-in policy loads")
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config(&[]))
}

pub fn spawn_app_with(config: AppConfig) -> TestApp {
    let state = test_state(config);
    TestApp {
        router: init_router(state.clone()),
        state,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

/// Signs access claims for an admin account with an arbitrary algorithm, secret and lifetime.
pub fn sign_access_token(
    state: &AppState,
    algorithm: jsonwebtoken::Algorithm,
    secret: &str,
    expires_in_secs: i64,
) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "00000000-0000-0000-0000-000000000001".to_string(),
        email: ADMIN_EMAIL.to_string(),
        role: "admin".to_string(),
        iat: now - 3600,
        exp: now + expires_in_secs,
        nbf: now - 3600,
        iss: state.config.jwt.issuer.clone(),
        jti: format!("forged-{now}"),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(algorithm),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn login(router: &Router, email: &str, password: &str) -> TestResponse {
    send(
        router,
        json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        ),
    )
    .await
}

/// Logs in with [`PASSWORD`] and returns `(access_token, refresh_token)`.
pub async fn login_tokens(router: &Router, email: &str) -> (String, String) {
    let response = login(router, email, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
    let tokens = &response.body["tokens"];
    (
        tokens["access_token"].as_str().unwrap().to_string(),
        tokens["refresh_token"].as_str().unwrap().to_string(),
    )
}

/// Asserts the envelope shape and returns its `error` object.
pub fn assert_envelope(response: &TestResponse, status: StatusCode, code: &str) -> Value {
    assert_eq!(response.status, status, "body: {}", response.body);
    assert_eq!(response.body["success"], false);
    let error = response.body["error"].clone();
    assert_eq!(error["code"], code, "body: {}", response.body);
    assert_eq!(error["http_status"], status.as_u16());
    assert!(error["message"].is_string());
    assert!(error["timestamp"].is_string());
    error
}
