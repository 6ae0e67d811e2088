mod common;

use axum::http::{StatusCode, header};
use common::{
    ADMIN_EMAIL, EDITOR_EMAIL, PASSWORD, WRITER_EMAIL, assert_envelope, authed_json_request, get,
    get_with_token, json_request, login, login_tokens, send, sign_access_token, spawn_app,
};
use jsonwebtoken::Algorithm;
use contacthub::contacthub_core::permissions;
use contacthub::middleware::context::X_REQUEST_ID;
use contacthub::modules::auth::service::MAX_FAILED_LOGINS;
use serde_json::json;

#[tokio::test]
async fn test_login_success() {
    let app = spawn_app();

    let response = login(&app.router, ADMIN_EMAIL, PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(response.body["user"]["role"], "admin");
    assert!(response.body["user"]["last_login_at"].is_string());

    let tokens = &response.body["tokens"];
    assert!(tokens["access_token"].is_string());
    assert!(tokens["refresh_token"].is_string());
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["expires_in"], 3600);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = spawn_app();

    let response = login(&app.router, "Admin@ContactHub.TEST", PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_unknown_email() {
    let app = spawn_app();

    let response = login(&app.router, "nobody@contacthub.test", PASSWORD).await;

    let error = assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS");
    assert_eq!(error["message"], "Invalid credentials");
    assert_eq!(error["category"], "security");
}

#[tokio::test]
async fn test_login_wrong_password_reads_like_unknown_email() {
    let app = spawn_app();

    let unknown = login(&app.router, "nobody@contacthub.test", "whatever").await;
    let wrong = login(&app.router, EDITOR_EMAIL, "wrong-password").await;

    let unknown = assert_envelope(&unknown, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS");
    let wrong = assert_envelope(&wrong, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS");
    assert_eq!(unknown["message"], wrong["message"]);
}

#[tokio::test]
async fn test_login_reports_every_invalid_field() {
    let app = spawn_app();

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "not-an-email", "password": "" }),
        ),
    )
    .await;

    let error = assert_envelope(&response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
    let fields: Vec<&str> = error["field_errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_login_missing_field() {
    let app = spawn_app();

    let response = send(
        &app.router,
        json_request("POST", "/api/auth/login", json!({ "email": ADMIN_EMAIL })),
    )
    .await;

    let error = assert_envelope(&response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
    assert_eq!(error["field_errors"][0]["field"], "password");
    assert_eq!(error["field_errors"][0]["code"], "required");
}

#[tokio::test]
async fn test_login_malformed_json() {
    let app = spawn_app();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = send(&app.router, request).await;

    let error = assert_envelope(&response, StatusCode::BAD_REQUEST, "BAD_REQUEST");
    assert_eq!(error["category"], "validation");
    assert_eq!(error["severity"], "low");
}

#[tokio::test]
async fn test_account_locks_after_repeated_failures() {
    let app = spawn_app();

    for _ in 1..MAX_FAILED_LOGINS {
        let response = login(&app.router, WRITER_EMAIL, "wrong-password").await;
        assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS");
    }

    let response = login(&app.router, WRITER_EMAIL, "wrong-password").await;
    let error = assert_envelope(&response, StatusCode::FORBIDDEN, "ACCOUNT_LOCKED");
    assert_eq!(error["severity"], "critical");

    // The right password no longer helps
    let response = login(&app.router, WRITER_EMAIL, PASSWORD).await;
    assert_envelope(&response, StatusCode::FORBIDDEN, "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn test_successful_login_resets_failure_count() {
    let app = spawn_app();

    for _ in 1..MAX_FAILED_LOGINS {
        login(&app.router, WRITER_EMAIL, "wrong-password").await;
    }
    let response = login(&app.router, WRITER_EMAIL, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = login(&app.router, WRITER_EMAIL, "wrong-password").await;
    assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_validate_returns_identity() {
    let app = spawn_app();
    let (access, _) = login_tokens(&app.router, EDITOR_EMAIL).await;

    let response = send(&app.router, get_with_token("/api/auth/validate", &access)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], EDITOR_EMAIL);
    assert_eq!(response.body["role"], "editor");
    assert!(response.body["subject_id"].is_string());
}

#[tokio::test]
async fn test_validate_without_header() {
    let app = spawn_app();

    let response = send(&app.router, get("/api/auth/validate")).await;

    let error = assert_envelope(&response, StatusCode::UNAUTHORIZED, "MISSING_AUTH_HEADER");
    assert_eq!(error["message"], "Authorization header is required");
    assert_eq!(error["endpoint"], "/api/auth/validate");
    assert_eq!(error["method"], "GET");
}

#[tokio::test]
async fn test_validate_with_wrong_scheme() {
    let app = spawn_app();

    let request = axum::http::Request::builder()
        .uri("/api/auth/validate")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER");
}

#[tokio::test]
async fn test_validate_with_garbage_token() {
    let app = spawn_app();

    let response = send(&app.router, get_with_token("/api/auth/validate", "abc.def.ghi")).await;

    let error = assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    assert_eq!(error["message"], "Invalid or malformed token");
}

#[tokio::test]
async fn test_validate_with_expired_token() {
    let app = spawn_app();
    let secret = app.state.config.jwt.access_secret.clone();
    let token = sign_access_token(&app.state, Algorithm::HS256, &secret, -120);

    let response = send(&app.router, get_with_token("/api/auth/validate", &token)).await;

    let error = assert_envelope(&response, StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED");
    assert_eq!(error["message"], "Token has expired");
}

#[tokio::test]
async fn test_rejected_tokens_read_the_same() {
    let app = spawn_app();
    let secret = app.state.config.jwt.access_secret.clone();
    let wrong_secret = sign_access_token(
        &app.state,
        Algorithm::HS256,
        "some-other-secret-0123456789abcdef",
        3600,
    );
    let wrong_algorithm = sign_access_token(&app.state, Algorithm::HS512, &secret, 3600);

    let first = send(&app.router, get_with_token("/api/auth/validate", &wrong_secret)).await;
    let second = send(&app.router, get_with_token("/api/auth/validate", &wrong_algorithm)).await;

    let first = assert_envelope(&first, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    let second = assert_envelope(&second, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    assert_eq!(first["message"], second["message"]);
    assert_eq!(first["context"], second["context"]);
    assert_eq!(first["context"], json!({}));
}

#[tokio::test]
async fn test_wrong_algorithm_is_rejected_on_admin_route() {
    let app = spawn_app();
    let secret = app.state.config.jwt.access_secret.clone();
    let token = sign_access_token(&app.state, Algorithm::HS512, &secret, 3600);

    let response = send(&app.router, get_with_token("/api/admin/policy", &token)).await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_revoked_refresh_token_hides_the_reason() {
    let app = spawn_app();
    let (_, refresh) = login_tokens(&app.router, EDITOR_EMAIL).await;
    let body = json!({ "refresh_token": refresh });

    let first = send(&app.router, json_request("POST", "/api/auth/refresh", body.clone())).await;
    assert_eq!(first.status, StatusCode::OK);
    let reused = send(&app.router, json_request("POST", "/api/auth/refresh", body)).await;

    let error = assert_envelope(&reused, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    assert_eq!(error["context"], json!({}));
    assert!(!reused.body.to_string().contains("revoked"));
}

#[tokio::test]
async fn test_refresh_token_cannot_authenticate_requests() {
    let app = spawn_app();
    let (_, refresh) = login_tokens(&app.router, EDITOR_EMAIL).await;

    let response = send(&app.router, get_with_token("/api/auth/validate", &refresh)).await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_reuse() {
    let app = spawn_app();
    let (_, refresh) = login_tokens(&app.router, EDITOR_EMAIL).await;

    let first = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/refresh",
            json!({ "refresh_token": refresh }),
        ),
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);
    let rotated = first.body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    let new_access = first.body["access_token"].as_str().unwrap();
    let response = send(&app.router, get_with_token("/api/auth/validate", new_access)).await;
    assert_eq!(response.status, StatusCode::OK);

    let reuse = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/refresh",
            json!({ "refresh_token": refresh }),
        ),
    )
    .await;
    assert_envelope(&reuse, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");

    let next = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/refresh",
            json!({ "refresh_token": rotated }),
        ),
    )
    .await;
    assert_eq!(next.status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = spawn_app();
    let (access, _) = login_tokens(&app.router, EDITOR_EMAIL).await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/refresh",
            json!({ "refresh_token": access }),
        ),
    )
    .await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = spawn_app();
    let (access, refresh) = login_tokens(&app.router, EDITOR_EMAIL).await;

    let response = send(
        &app.router,
        authed_json_request(
            "POST",
            "/api/auth/logout",
            &access,
            json!({ "refresh_token": refresh }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logged out successfully");

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/refresh",
            json!({ "refresh_token": refresh }),
        ),
    )
    .await;
    assert_envelope(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_logout_rejects_foreign_refresh_token() {
    let app = spawn_app();
    let (editor_access, _) = login_tokens(&app.router, EDITOR_EMAIL).await;
    let (_, admin_refresh) = login_tokens(&app.router, ADMIN_EMAIL).await;

    let response = send(
        &app.router,
        authed_json_request(
            "POST",
            "/api/auth/logout",
            &editor_access,
            json!({ "refresh_token": admin_refresh }),
        ),
    )
    .await;
    assert_envelope(&response, StatusCode::FORBIDDEN, "FORBIDDEN");

    // Still usable by its owner
    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/refresh",
            json!({ "refresh_token": admin_refresh }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let app = spawn_app();
    let (_, refresh) = login_tokens(&app.router, EDITOR_EMAIL).await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/logout",
            json!({ "refresh_token": refresh }),
        ),
    )
    .await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "MISSING_AUTH_HEADER");
}

#[tokio::test]
async fn test_permissions_for_authenticated_caller() {
    let app = spawn_app();
    let (access, _) = login_tokens(&app.router, WRITER_EMAIL).await;

    let response = send(&app.router, get_with_token("/api/auth/permissions", &access)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["role"], "content_writer");
    let granted: Vec<&str> = response.body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(granted.contains(&permissions::BLOGS_WRITE));
    assert!(!granted.contains(&permissions::CONTACTS_WRITE));
}

#[tokio::test]
async fn test_permissions_for_anonymous_caller() {
    let app = spawn_app();

    let response = send(&app.router, get("/api/auth/permissions")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["role"].is_null());
    assert_eq!(response.body["permissions"], json!([]));
}

#[tokio::test]
async fn test_permissions_with_invalid_token_stays_anonymous() {
    let app = spawn_app();

    let response = send(&app.router, get_with_token("/api/auth/permissions", "nope")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["role"].is_null());
}

#[tokio::test]
async fn test_admin_policy_requires_admin() {
    let app = spawn_app();
    let (editor_access, _) = login_tokens(&app.router, EDITOR_EMAIL).await;
    let (admin_access, _) = login_tokens(&app.router, ADMIN_EMAIL).await;

    let denied = send(&app.router, get_with_token("/api/admin/policy", &editor_access)).await;
    let error = assert_envelope(&denied, StatusCode::FORBIDDEN, "ADMIN_REQUIRED");
    assert_eq!(error["message"], "Admin access required");

    let allowed = send(&app.router, get_with_token("/api/admin/policy", &admin_access)).await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert!(allowed.body["roles"]["editor"].is_array());
    assert_eq!(allowed.body["roles"]["admin"], json!(["*"]));
}

#[tokio::test]
async fn test_admin_policy_without_token() {
    let app = spawn_app();

    let response = send(&app.router, get("/api/admin/policy")).await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "MISSING_AUTH_HEADER");
}

#[tokio::test]
async fn test_request_id_is_generated_and_echoed() {
    let app = spawn_app();

    let response = send(&app.router, get("/api/auth/validate")).await;

    let header_id = response
        .headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert_eq!(response.body["error"]["request_id"], header_id);
    assert_eq!(response.body["request_id"], header_id);
    assert!(uuid::Uuid::parse_str(&header_id).is_ok());
}

#[tokio::test]
async fn test_incoming_request_id_is_honoured() {
    let app = spawn_app();
    let incoming = "6f1c0c59-6d5d-4f7e-9a39-0d4c8e3b1a2f";

    let request = axum::http::Request::builder()
        .uri("/api/auth/validate")
        .header(&X_REQUEST_ID, incoming)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;

    assert_eq!(response.headers.get(&X_REQUEST_ID).unwrap(), incoming);
    assert_eq!(response.body["error"]["request_id"], incoming);
}

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let app = spawn_app();

    let health = send(&app.router, get("/health")).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let docs = send(&app.router, get("/api-docs/openapi.json")).await;
    assert_eq!(docs.status, StatusCode::OK);
    assert!(docs.body["paths"]["/api/auth/login"].is_object());
    assert!(docs.body["components"]["schemas"]["ErrorEnvelope"].is_object());
}
