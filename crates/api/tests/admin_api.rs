//! HTTP-level tests for admin login, the admin token guard and admin
//! vehicle management.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_vehicle, delete_admin, get, get_admin, login_from, login_from_peer,
    patch_json_admin, post_json_admin, ADMIN_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

const VIN: &str = "1HGCM82633A004352";

// ---------------------------------------------------------------------------
// Login and token guard
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_a_usable_token(pool: PgPool) {
    let test = common::build_test_app(pool);

    let response = login_from(test.app(), "10.0.0.1", ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Login successful");

    let token = json["token"].as_str().expect("token").to_string();
    let response = get_admin(test.app(), "/api/admin/vehicles", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_reports_remaining_attempts(pool: PgPool) {
    let test = common::build_test_app(pool);

    let response = login_from(test.app(), "10.0.0.2", "nope").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Invalid password. 4 attempt(s) remaining.");
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_failures_lock_out_only_that_ip(pool: PgPool) {
    let test = common::build_test_app(pool);

    for _ in 0..4 {
        login_from(test.app(), "10.0.0.3", "nope").await;
    }
    let fifth = body_json(login_from(test.app(), "10.0.0.3", "nope").await).await;
    assert_eq!(fifth["detail"], "Too many failed attempts. Try again in 15 minute(s).");

    // Even the right password is refused while locked out.
    let response = login_from(test.app(), "10.0.0.3", ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = login_from(test.app(), "10.0.0.4", ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn direct_clients_are_throttled_by_peer_address(pool: PgPool) {
    let test = common::build_test_app(pool);
    let attacker = "203.0.113.7:51000".parse().unwrap();
    let admin = "198.51.100.2:52000".parse().unwrap();

    for _ in 0..5 {
        login_from_peer(test.app(), attacker, "nope").await;
    }
    let response = login_from_peer(test.app(), attacker, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = login_from_peer(test.app(), admin, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_rejected_with_hint(pool: PgPool) {
    let test = common::build_test_app(pool);

    let response = get(test.app(), "/api/admin/vehicles").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(
        json["detail"],
        "Missing admin token. Include 'x-admin-token' header."
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_token_is_rejected(pool: PgPool) {
    let test = common::build_test_app(pool);

    let response = get_admin(test.app(), "/api/admin/vehicles", "cma-admin-static").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], "Invalid admin token");
}

// ---------------------------------------------------------------------------
// Vehicle CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_normalizes_vin_and_generates_stock_number(pool: PgPool) {
    let test = common::build_test_app(pool);

    let vehicle = create_vehicle(&test, &VIN.to_lowercase(), json!({ "condition": "nuevo" })).await;
    assert_eq!(vehicle["vin"], VIN);
    assert_eq!(vehicle["condition"], "New");
    assert_eq!(vehicle["is_active"], true);
    let stock = vehicle["stock_number"].as_str().unwrap();
    assert!(stock.starts_with("CMA"));
    assert_eq!(stock.len(), 9);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_vin_is_a_bad_request(pool: PgPool) {
    let test = common::build_test_app(pool);
    create_vehicle(&test, VIN, json!({})).await;

    let response = post_json_admin(
        test.app(),
        "/api/admin/vehicles",
        &test.admin_token(),
        json!({ "vin": VIN, "year": 2020, "make": "Honda", "model": "Accord", "price": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Vehicle with this VIN already exists."
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_input_is_rejected(pool: PgPool) {
    let test = common::build_test_app(pool);
    let token = test.admin_token();

    let bad_vin = post_json_admin(
        test.app(),
        "/api/admin/vehicles",
        &token,
        json!({ "vin": "1HGCM82633A00435I", "year": 2020, "make": "Honda", "model": "Civic", "price": 1 }),
    )
    .await;
    assert_eq!(bad_vin.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(bad_vin).await["detail"], "VIN contains invalid characters");

    let negative = post_json_admin(
        test.app(),
        "/api/admin/vehicles",
        &token,
        json!({ "vin": VIN, "year": 2020, "make": "Honda", "model": "Civic", "price": -5 }),
    )
    .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(negative).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn patch_changes_only_present_fields(pool: PgPool) {
    let test = common::build_test_app(pool);
    let created = create_vehicle(&test, VIN, json!({ "mileage": 42000, "trim": "EX" })).await;
    let uri = format!("/api/admin/vehicles/{}", created["id"]);

    let response = patch_json_admin(test.app(), &uri, &test.admin_token(), json!({ "price": 17250 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["price"], 17250);
    assert_eq!(updated["mileage"], 42000);
    assert_eq!(updated["trim"], "EX");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_then_get_is_not_found(pool: PgPool) {
    let test = common::build_test_app(pool);
    let token = test.admin_token();
    let created = create_vehicle(&test, VIN, json!({})).await;
    let uri = format!("/api/admin/vehicles/{}", created["id"]);

    assert_eq!(delete_admin(test.app(), &uri, &token).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(get_admin(test.app(), &uri, &token).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete_admin(test.app(), &uri, &token).await.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_list_includes_inactive_vehicles(pool: PgPool) {
    let test = common::build_test_app(pool);
    create_vehicle(&test, VIN, json!({ "is_active": false })).await;
    create_vehicle(&test, "2T1BURHE0JC123456", json!({})).await;

    let json = body_json(get_admin(test.app(), "/api/admin/vehicles", &test.admin_token()).await).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}
