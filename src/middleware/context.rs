//! Typed request-scoped context.
//!
//! [`RequestScope`] is created once per request by [`request_context`], the outermost layer,
//! and shared through the request extensions as `Arc<RequestScope>`. Every later layer reads
//! it instead of re-parsing headers, and the authenticator binds the caller's identity into it.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use contacthub_auth::Identity;
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

pub const UNKNOWN_IP: &str = "unknown";

#[derive(Debug)]
pub struct RequestScope {
    pub request_id: String,
    pub method: String,
    pub path: String,
    /// Route template such as `/api/auth/login`, when the request matched one.
    pub route: Option<String>,
    pub ip: String,
    pub user_agent: Option<String>,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub started_at: Instant,
    identity: OnceLock<Identity>,
}

impl RequestScope {
    pub fn from_request(req: &Request) -> Self {
        let headers = req.headers();
        let connect_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Self {
            request_id: request_id(headers),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            route: req
                .extensions()
                .get::<MatchedPath>()
                .map(|p| p.as_str().to_string()),
            ip: connect_ip.unwrap_or_else(|| forwarded_ip(headers)),
            user_agent: header_str(headers, &header::USER_AGENT),
            query: req.uri().query().map(str::to_string),
            content_type: header_str(headers, &header::CONTENT_TYPE),
            content_length: header_str(headers, &header::CONTENT_LENGTH)
                .and_then(|v| v.parse().ok()),
            started_at: Instant::now(),
            identity: OnceLock::new(),
        }
    }

    /// Binds the authenticated caller. Returns false if an identity was already bound.
    pub fn bind_identity(&self, identity: Identity) -> bool {
        self.identity.set(identity).is_ok()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// Route template when matched, raw path otherwise. Keeps metric label cardinality bounded.
    pub fn route_or_path(&self) -> &str {
        self.route.as_deref().unwrap_or(&self.path)
    }
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Honours a well-formed incoming `X-Request-ID`, otherwise mints a v4 UUID.
fn request_id(headers: &HeaderMap) -> String {
    header_str(headers, &X_REQUEST_ID)
        .and_then(|v| Uuid::parse_str(&v).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string()
}

fn forwarded_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = header_str(headers, &X_FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    header_str(headers, &X_REAL_IP).unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// Outermost layer: installs the scope and echoes `X-Request-ID` on every response.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let scope = Arc::new(RequestScope::from_request(&req));
    let request_id = scope.request_id.clone();
    req.extensions_mut().insert(scope);

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().method("POST").uri("/api/auth/login?next=%2F");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_scope_reads_request_metadata() {
        let scope = RequestScope::from_request(&request(&[
            ("user-agent", "curl/8.0"),
            ("content-type", "application/json"),
            ("content-length", "17"),
        ]));

        assert_eq!(scope.method, "POST");
        assert_eq!(scope.path, "/api/auth/login");
        assert_eq!(scope.query.as_deref(), Some("next=%2F"));
        assert_eq!(scope.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(scope.content_type.as_deref(), Some("application/json"));
        assert_eq!(scope.content_length, Some(17));
        assert_eq!(scope.ip, UNKNOWN_IP);
        assert!(Uuid::parse_str(&scope.request_id).is_ok());
    }

    #[test]
    fn test_valid_incoming_request_id_is_kept() {
        let id = "6f1c1c5e-8a43-4d2b-9b47-5bb5a7b0c6f1";
        let scope = RequestScope::from_request(&request(&[("x-request-id", id)]));
        assert_eq!(scope.request_id, id);
    }

    #[test]
    fn test_garbage_request_id_is_replaced() {
        let scope = RequestScope::from_request(&request(&[("x-request-id", "<script>")]));
        assert_ne!(scope.request_id, "<script>");
        assert!(Uuid::parse_str(&scope.request_id).is_ok());
    }

    #[test]
    fn test_forwarded_ip_precedence() {
        let scope = RequestScope::from_request(&request(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]));
        assert_eq!(scope.ip, "203.0.113.7");

        let scope = RequestScope::from_request(&request(&[("x-real-ip", "198.51.100.2")]));
        assert_eq!(scope.ip, "198.51.100.2");
    }

    #[test]
    fn test_identity_binds_once() {
        let scope = RequestScope::from_request(&request(&[]));
        let first = Identity {
            subject_id: "1".into(),
            email: "a@b.com".into(),
            role: "admin".into(),
        };
        let second = Identity {
            subject_id: "2".into(),
            ..first.clone()
        };

        assert!(scope.bind_identity(first));
        assert!(!scope.bind_identity(second));
        assert_eq!(scope.identity().unwrap().subject_id, "1");
    }
}
