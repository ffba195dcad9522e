#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use chooseme_api::auth::jwt::{generate_admin_token, JwtConfig};
use chooseme_api::auth::password::hash_password;
use chooseme_api::config::{AdminAuthConfig, ServerConfig};
use chooseme_api::router::build_app_router;
use chooseme_api::state::AppState;
use chooseme_core::login_throttle::LoginThrottle;
use chooseme_events::alerts::AlertSettings;
use chooseme_events::{EventBus, LeadAlertRouter};

/// Admin password accepted by every test app.
pub const ADMIN_PASSWORD: &str = "test-admin-password";

/// A test application plus the temporary upload directory it writes to.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    uploads: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// A freshly signed admin token.
    pub fn admin_token(&self) -> String {
        generate_admin_token(&self.state.config.jwt).expect("token generation should succeed")
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        upload_dir: upload_dir.to_path_buf(),
        environment: "test".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            token_expiry_mins: 60,
        },
        admin: AdminAuthConfig {
            password_hash: hash_password(ADMIN_PASSWORD).expect("hashing should succeed"),
            max_login_attempts: 5,
            lockout_minutes: 15,
        },
    }
}

/// Build the full application router, with the production middleware
/// stack, against the given database pool. Alerts are disabled.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let uploads = tempfile::tempdir().expect("temp dir");
    let config = test_config(uploads.path());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        alerts: Arc::new(LeadAlertRouter::new(
            AlertSettings::default(),
            None,
            None,
            None,
        )),
        login_throttle: Arc::new(Mutex::new(LoginThrottle::new(
            config.admin.max_login_attempts,
            Duration::from_secs(config.admin.lockout_minutes * 60),
        ))),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        uploads,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(t) => builder.header("x-admin-token", t),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, builder("GET", uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_admin(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, builder("GET", uri, Some(token)).body(Body::empty()).unwrap()).await
}

pub async fn delete_admin(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, builder("DELETE", uri, Some(token)).body(Body::empty()).unwrap()).await
}

async fn json_request(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let request = builder(method, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, "POST", uri, None, body).await
}

pub async fn post_json_admin(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, "POST", uri, Some(token), body).await
}

pub async fn patch_json_admin(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, "PATCH", uri, Some(token), body).await
}

pub async fn post_empty_admin(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, builder("POST", uri, Some(token)).body(Body::empty()).unwrap()).await
}

/// A login request as seen from a specific client IP.
pub async fn login_from(app: Router, ip: &str, password: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(serde_json::json!({ "password": password }).to_string()))
        .unwrap();
    send(app, request).await
}

/// A login request from a direct connection with no proxy headers.
pub async fn login_from_peer(app: Router, peer: SocketAddr, password: &str) -> Response<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/admin/login")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "password": password }).to_string()))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    send(app, request).await
}

const BOUNDARY: &str = "chooseme-test-boundary";

/// One file part of a multipart body.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub fn multipart_body(parts: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart_admin(
    app: Router,
    uri: &str,
    token: &str,
    parts: &[FilePart<'_>],
) -> Response<Body> {
    let request = builder("POST", uri, Some(token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a vehicle through the admin API and return its JSON.
pub async fn create_vehicle(test: &TestApp, vin: &str, body: serde_json::Value) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "vin": vin,
        "year": 2021,
        "make": "Honda",
        "model": "Civic",
        "price": 18500,
    });
    if let (Some(base), Some(extra)) = (payload.as_object_mut(), body.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    let response = post_json_admin(test.app(), "/api/admin/vehicles", &test.admin_token(), payload).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}
