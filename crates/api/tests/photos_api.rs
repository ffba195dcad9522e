//! HTTP-level tests for admin photo upload, primary selection and removal.

mod common;

use std::io::Cursor;

use axum::http::StatusCode;
use common::{body_bytes, body_json, create_vehicle, delete_admin, get, post_empty_admin, post_multipart_admin, FilePart};
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::json;
use sqlx::PgPool;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(width, height, Rgb([20, 90, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn photo<'a>(filename: &'a str, bytes: &'a [u8]) -> FilePart<'a> {
    FilePart {
        field: "files",
        filename,
        content_type: "image/png",
        bytes,
    }
}

async fn vehicle_id(test: &common::TestApp) -> i64 {
    let vehicle = create_vehicle(test, "1HGCM82633A004352", json!({ "stock_number": "CMA555555" })).await;
    vehicle["id"].as_i64().unwrap()
}

async fn upload(test: &common::TestApp, id: i64, parts: &[FilePart<'_>]) -> axum::response::Response {
    post_multipart_admin(
        test.app(),
        &format!("/api/admin/vehicles/{id}/photos"),
        &test.admin_token(),
        parts,
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_stores_photos_and_thumbnails(pool: PgPool) {
    let test = common::build_test_app(pool);
    let id = vehicle_id(&test).await;
    let big = png(1200, 900);
    let small = png(40, 30);

    let response = upload(&test, id, &[photo("front.png", &big), photo("side.PNG", &small)]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["photo_count"], 2);
    let images = json["images"].as_array().unwrap();
    assert_eq!(images[0]["is_primary"], true);
    assert_eq!(images[1]["is_primary"], false);
    assert_eq!(images[0]["original_filename"], "front.png");
    assert!(images[1]["url"].as_str().unwrap().ends_with(".jpg"));

    // The thumbnail is served from the upload directory and fits the box.
    let thumb_url = images[0]["thumbnail_url"].as_str().unwrap();
    assert!(thumb_url.starts_with(&format!("/admin-vehicles/{id}/")));
    let response = get(test.app(), thumb_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    let thumb = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (600, 450));

    // Public detail picks up the primary photo.
    let detail = body_json(get(test.app(), "/api/vehicles/CMA555555").await).await;
    assert_eq!(detail["primary_image_url"], images[0]["url"]);
    assert_eq!(detail["images"][0]["thumb_url"], thumb_url);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_upload_keeps_existing_primary(pool: PgPool) {
    let test = common::build_test_app(pool);
    let id = vehicle_id(&test).await;
    let bytes = png(10, 10);

    upload(&test, id, &[photo("a.png", &bytes)]).await;
    let json = body_json(upload(&test, id, &[photo("b.png", &bytes)]).await).await;

    let primaries: Vec<bool> = json["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|img| img["is_primary"].as_bool().unwrap())
        .collect();
    assert_eq!(primaries, vec![true, false]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_primary_and_delete_promotes_next(pool: PgPool) {
    let test = common::build_test_app(pool);
    let token = test.admin_token();
    let id = vehicle_id(&test).await;
    let bytes = png(10, 10);

    let json = body_json(
        upload(&test, id, &[photo("a.png", &bytes), photo("b.png", &bytes), photo("c.png", &bytes)]).await,
    )
    .await;
    let ids: Vec<String> = json["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|img| img["upload_id"].as_str().unwrap().to_string())
        .collect();

    let response = post_empty_admin(
        test.app(),
        &format!("/api/admin/vehicles/{id}/photos/{}/primary", ids[1]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["images"][0]["is_primary"], false);
    assert_eq!(json["images"][1]["is_primary"], true);

    let removed_url = json["images"][1]["url"].as_str().unwrap().to_string();
    let response = delete_admin(
        test.app(),
        &format!("/api/admin/vehicles/{id}/photos/{}", ids[1]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["photo_count"], 2);
    assert_eq!(json["images"][1]["upload_id"], ids[2].as_str());
    assert_eq!(json["images"][1]["is_primary"], true);

    // The file is gone from disk.
    assert_eq!(get(test.app(), &removed_url).await.status(), StatusCode::NOT_FOUND);

    let response = delete_admin(
        test.app(),
        &format!("/api/admin/vehicles/{id}/photos/nope"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn legacy_photo_urls_can_be_addressed_by_url(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let id = vehicle_id(&test).await;
    sqlx::query("UPDATE vehicles SET photo_urls = $2 WHERE id = $1")
        .bind(id)
        .bind(vec!["https://cdn.example/1.jpg", "https://cdn.example/2.jpg"])
        .execute(&pool)
        .await
        .unwrap();

    let response = post_empty_admin(
        test.app(),
        &format!("/api/admin/vehicles/{id}/photos/https:%2F%2Fcdn.example%2F2.jpg/primary"),
        &test.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["photo_urls"], json!(["https://cdn.example/1.jpg", "https://cdn.example/2.jpg"]));
    assert_eq!(json["images"][1]["is_primary"], true);
    assert_eq!(json["images"][0]["is_primary"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejects_bad_files(pool: PgPool) {
    let test = common::build_test_app(pool);
    let id = vehicle_id(&test).await;

    let response = upload(
        &test,
        id,
        &[FilePart {
            field: "files",
            filename: "notes.pdf",
            content_type: "application/pdf",
            bytes: b"%PDF-1.4",
        }],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["detail"].as_str().unwrap().contains("Invalid file type"));

    let good = png(10, 10);
    let response = upload(&test, id, &[photo("ok.png", &good), photo("fake.jpg", b"not an image")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "File 'fake.jpg' is not a valid image");
    // Nothing from the failed batch is left behind.
    let dir = test.upload_dir().join(id.to_string());
    let leftovers = std::fs::read_dir(&dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejects_more_than_twelve_files(pool: PgPool) {
    let test = common::build_test_app(pool);
    let id = vehicle_id(&test).await;
    let bytes = png(4, 4);
    let names: Vec<String> = (0..13).map(|i| format!("p{i}.png")).collect();
    let parts: Vec<FilePart<'_>> = names.iter().map(|n| photo(n, &bytes)).collect();

    let response = upload(&test, id, &parts).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Upload limit exceeded: maximum 12 photos per upload"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_to_unknown_vehicle_is_not_found(pool: PgPool) {
    let test = common::build_test_app(pool);
    let bytes = png(4, 4);
    let response = upload(&test, 999_999, &[photo("a.png", &bytes)]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
