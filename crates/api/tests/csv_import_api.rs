//! HTTP-level tests for the CSV inventory import.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, create_vehicle, get, get_admin, post_multipart_admin, FilePart};
use serde_json::json;
use sqlx::PgPool;

const EXISTING_VIN: &str = "1HGCM82633A004352";
const NEW_VIN: &str = "2T1BURHE0JC123456";

fn csv_part(bytes: &[u8]) -> FilePart<'_> {
    FilePart {
        field: "file",
        filename: "inventory.csv",
        content_type: "text/csv",
        bytes,
    }
}

/// Header on line 1; one update, one create, three skips.
fn mixed_csv() -> String {
    [
        "VIN,Year,Make,Model,Price,Mileage,Condition",
        &format!("{EXISTING_VIN},2021,Honda,Accord,\"$21,500\",30000,used"),
        &format!("{},2022,Toyota,Corolla,19900,,new", NEW_VIN.to_lowercase()),
        "BADVIN,2020,Ford,Focus,9000,,",
        &format!("{NEW_VIN},2022,Toyota,Corolla,19900,,"),
        "3VWFE21C04M000001,1800,VW,Jetta,-5,,",
    ]
    .join("\n")
}

async fn import(test: &common::TestApp, query: &str, bytes: &[u8]) -> axum::response::Response {
    post_multipart_admin(
        test.app(),
        &format!("/api/admin/vehicles/import-csv{query}"),
        &test.admin_token(),
        &[csv_part(bytes)],
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dry_run_partitions_rows_without_writing(pool: PgPool) {
    let test = common::build_test_app(pool);
    create_vehicle(&test, EXISTING_VIN, json!({ "price": 20000 })).await;
    let csv = mixed_csv();

    // dry_run defaults to true.
    let response = import(&test, "", csv.as_bytes()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;

    assert_eq!(report["dry_run"], true);
    assert_eq!(report["counts"]["total_rows"], 5);
    assert_eq!(report["counts"]["to_create"], 1);
    assert_eq!(report["counts"]["to_update"], 1);
    assert_eq!(report["counts"]["skipped"], 3);
    assert_eq!(report["counts"]["created"], 0);

    assert_eq!(report["to_update"][0]["row"], 2);
    assert_eq!(report["to_update"][0]["price"], 21500);
    assert_eq!(report["to_create"][0]["vin"], NEW_VIN);

    let skipped_rows: Vec<i64> = report["skipped"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["row"].as_i64().unwrap())
        .collect();
    assert_eq!(skipped_rows, vec![4, 5, 6]);
    assert_eq!(
        report["skipped"][1]["reasons"][0],
        "Row 5: Duplicate VIN in file (first seen on row 3)"
    );
    let last_reasons = report["skipped"][2]["reasons"].as_array().unwrap();
    assert_eq!(last_reasons.len(), 2, "every problem on the row is reported");

    // Nothing was written.
    let list = body_json(get(test.app(), "/api/vehicles").await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["price"], 20000);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_vin_with_missing_price_is_skipped(pool: PgPool) {
    let test = common::build_test_app(pool);
    let csv = format!("vin,year,make,model,price\n{NEW_VIN},2022,Toyota,Corolla,19900\n{NEW_VIN},2022,Toyota,Corolla,\n");

    let report = body_json(import(&test, "?dry_run=true", csv.as_bytes()).await).await;
    assert_eq!(report["to_create"].as_array().unwrap().len(), 1);
    assert_eq!(report["to_create"][0]["row"], 2);
    assert!(report["to_update"].as_array().unwrap().is_empty());

    let skipped = report["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["row"], 3);
    let reasons: Vec<&str> = skipped[0]["reasons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert!(reasons.iter().any(|r| r.contains("price")), "{reasons:?}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn commit_creates_and_updates(pool: PgPool) {
    let test = common::build_test_app(pool);
    create_vehicle(&test, EXISTING_VIN, json!({ "price": 20000, "stock_number": "CMA000777" })).await;
    let csv = mixed_csv();

    let response = import(&test, "?dry_run=false", csv.as_bytes()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["success"], true);
    assert_eq!(report["dry_run"], false);
    assert_eq!(report["counts"]["created"], 1);
    assert_eq!(report["counts"]["updated"], 1);

    let updated = body_json(get(test.app(), "/api/vehicles/CMA000777").await).await;
    assert_eq!(updated["price"], 21500);
    assert_eq!(updated["model"], "Accord");
    assert_eq!(updated["mileage"], 30000);

    let list = body_json(get(test.app(), "/api/vehicles?make=toyota").await).await;
    let created = &list.as_array().unwrap()[0];
    assert_eq!(created["vin"], NEW_VIN);
    assert_eq!(created["condition"], "New");
    assert!(created["stock_id"].as_str().unwrap().starts_with("CMA"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_required_columns_fail_the_file(pool: PgPool) {
    let test = common::build_test_app(pool);
    let csv = "vin,make,model\n1HGCM82633A004352,Honda,Civic\n";

    let response = import(&test, "", csv.as_bytes()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Missing required columns: year, price"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn oversized_or_wrong_type_files_are_rejected(pool: PgPool) {
    let test = common::build_test_app(pool);

    let big = vec![b'a'; 6 * 1024 * 1024];
    let response = import(&test, "", &big).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "File too large. Maximum size is 5MB");

    let response = post_multipart_admin(
        test.app(),
        "/api/admin/vehicles/import-csv",
        &test.admin_token(),
        &[FilePart {
            field: "file",
            filename: "inventory.xlsx",
            content_type: "application/octet-stream",
            bytes: b"vin,year,make,model,price\n",
        }],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Please select a CSV file");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_requires_a_file_part(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = post_multipart_admin(
        test.app(),
        "/api/admin/vehicles/import-csv",
        &test.admin_token(),
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "No file uploaded");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn template_is_a_csv_attachment(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get_admin(
        test.app(),
        "/api/admin/vehicles/csv-template",
        &test.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("vehicle_import_template.csv"));

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("vin,year,make,model,price"));
    assert!(lines.next().unwrap().starts_with("1HGCM82633A123456,2024,Honda"));
}
