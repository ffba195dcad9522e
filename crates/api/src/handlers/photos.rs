//! Vehicle photo management: `/api/admin/vehicles/{id}/photos`.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use chooseme_core::error::CoreError;
use chooseme_core::images::StoredImage;
use chooseme_core::photos::{
    append_photos, check_photo_file, check_upload_count, remove_photo, set_primary,
    MAX_PHOTOS_PER_UPLOAD, MAX_PHOTO_SIZE_BYTES,
};
use chooseme_core::types::DbId;
use chooseme_db::models::vehicle::Vehicle;
use chooseme_db::repositories::VehicleRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::admin::RequireAdmin;
use crate::state::AppState;
use crate::uploads::{remove_photo_files, save_photo};

/// Request body cap for the upload route: a full batch of maximum-size
/// photos plus multipart overhead.
pub const UPLOAD_BODY_LIMIT: usize = MAX_PHOTOS_PER_UPLOAD * MAX_PHOTO_SIZE_BYTES + 1024 * 1024;

/// Multipart field carrying the photos.
const FILES_FIELD: &str = "files";

/// Photo list after a mutation.
#[derive(Debug, Serialize)]
pub struct PhotosResponse {
    pub photo_count: usize,
    pub images: Vec<StoredImage>,
    pub photo_urls: Vec<String>,
}

impl PhotosResponse {
    fn new(images: Vec<StoredImage>) -> Self {
        Self {
            photo_count: images.len(),
            photo_urls: images.iter().map(|i| i.url.clone()).collect(),
            images,
        }
    }
}

struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

async fn load_vehicle(state: &AppState, id: DbId) -> AppResult<Vehicle> {
    VehicleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Vehicle", id)))
}

async fn store_images(state: &AppState, id: DbId, images: &[StoredImage]) -> AppResult<Vec<StoredImage>> {
    let vehicle = VehicleRepo::set_images(&state.pool, id, images)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Vehicle", id)))?;
    Ok(vehicle.images.0)
}

/// Photos are addressed by upload id. Legacy images migrated on the fly
/// get fresh ids on every read, so their URL is accepted as well.
fn resolve_photo_id(images: &[StoredImage], photo_id: &str) -> String {
    if images.iter().any(|img| img.upload_id == photo_id) {
        return photo_id.to_string();
    }
    images
        .iter()
        .find(|img| img.url == photo_id)
        .map(|img| img.upload_id.clone())
        .unwrap_or_else(|| photo_id.to_string())
}

/// Read every `files` part, validating name and size as they arrive.
async fn read_files(multipart: &mut Multipart) -> AppResult<Vec<UploadedFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        if files.len() == MAX_PHOTOS_PER_UPLOAD {
            check_upload_count(MAX_PHOTOS_PER_UPLOAD + 1)?;
        }
        let name = field.file_name().unwrap_or("photo").to_string();
        let bytes = field.bytes().await?;
        check_photo_file(&name, bytes.len())?;
        files.push(UploadedFile {
            name,
            bytes: bytes.to_vec(),
        });
    }
    check_upload_count(files.len())?;
    Ok(files)
}

/// POST /api/admin/vehicles/{id}/photos (multipart `files`)
///
/// Legacy `photo_urls` are migrated into the structured list first. On a
/// failed file, photos already written for this request are removed.
pub async fn upload(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<PhotosResponse>> {
    let vehicle = load_vehicle(&state, id).await?;
    let files = read_files(&mut multipart).await?;
    let upload_dir = state.config.upload_dir.as_path();

    let mut saved: Vec<StoredImage> = Vec::with_capacity(files.len());
    for file in files {
        match save_photo(upload_dir, id, &file.name, file.bytes).await {
            Ok(img) => saved.push(img),
            Err(e) => {
                for img in &saved {
                    remove_photo_files(upload_dir, img).await;
                }
                return Err(e);
            }
        }
    }

    let count = saved.len();
    let mut images = vehicle.stored_images();
    append_photos(&mut images, saved);
    let images = store_images(&state, id, &images).await?;

    tracing::info!(vehicle_id = id, uploaded = count, total = images.len(), "Uploaded vehicle photos");
    Ok(Json(PhotosResponse::new(images)))
}

/// DELETE /api/admin/vehicles/{id}/photos/{photo_id}
pub async fn delete(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path((id, photo_id)): Path<(DbId, String)>,
) -> AppResult<Json<PhotosResponse>> {
    let vehicle = load_vehicle(&state, id).await?;
    let mut images = vehicle.stored_images();
    let target = resolve_photo_id(&images, &photo_id);
    let removed = remove_photo(&mut images, &target)?;
    let images = store_images(&state, id, &images).await?;
    remove_photo_files(&state.config.upload_dir, &removed).await;

    tracing::info!(vehicle_id = id, photo_id = %photo_id, "Deleted vehicle photo");
    Ok(Json(PhotosResponse::new(images)))
}

/// POST /api/admin/vehicles/{id}/photos/{photo_id}/primary
pub async fn make_primary(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path((id, photo_id)): Path<(DbId, String)>,
) -> AppResult<Json<PhotosResponse>> {
    let vehicle = load_vehicle(&state, id).await?;
    let mut images = vehicle.stored_images();
    let target = resolve_photo_id(&images, &photo_id);
    set_primary(&mut images, &target)?;
    let images = store_images(&state, id, &images).await?;
    Ok(Json(PhotosResponse::new(images)))
}
