//! Integration tests for the probes and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_returns_ok_with_json(pool: PgPool) {
    let test = common::build_test_app(pool);

    for path in ["/health", "/api/health"] {
        let response = get(test.app(), path).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
        assert_eq!(json["db_healthy"], true);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn root_probe_names_the_service(pool: PgPool) {
    let test = common::build_test_app(pool);
    let json = body_json(get(test.app(), "/").await).await;

    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "Choose Me Auto API");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn version_reports_environment(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get(test.app(), "/api/version").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["environment"], "test");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get(test.app(), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn response_contains_x_request_id_header(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get(test.app(), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn notification_status_reports_deferred_channels(pool: PgPool) {
    let test = common::build_test_app(pool);
    let json = body_json(get(test.app(), "/api/notifications/status").await).await;

    assert_eq!(json["alerts_enabled"], false);
    for channel in ["email", "sms", "slack"] {
        assert_eq!(json[channel]["configured"], false);
        assert_eq!(json[channel]["status"], "deferred");
    }
}
