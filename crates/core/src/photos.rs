//! Admin photo upload rules and primary-image bookkeeping.

use crate::error::CoreError;
use crate::images::StoredImage;

/// Maximum files accepted in one upload request.
pub const MAX_PHOTOS_PER_UPLOAD: usize = 12;

/// Maximum size of one photo (15 MiB).
pub const MAX_PHOTO_SIZE_BYTES: usize = 15 * 1024 * 1024;

/// Accepted photo extensions, lower-case, with the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// Stored photos are scaled down to fit this box.
pub const PHOTO_MAX_WIDTH: u32 = 1920;
pub const PHOTO_MAX_HEIGHT: u32 = 1440;

/// Thumbnail bounding box in pixels.
pub const THUMBNAIL_MAX_WIDTH: u32 = 600;
pub const THUMBNAIL_MAX_HEIGHT: u32 = 450;

/// JPEG quality for stored photos and thumbnails.
pub const PHOTO_JPEG_QUALITY: u8 = 92;
pub const THUMBNAIL_JPEG_QUALITY: u8 = 85;

/// Public URL prefix of stored uploads.
pub const PHOTO_URL_PREFIX: &str = "/admin-vehicles";

pub fn check_upload_count(count: usize) -> Result<(), CoreError> {
    if count == 0 {
        return Err(CoreError::Validation("No files uploaded".into()));
    }
    if count > MAX_PHOTOS_PER_UPLOAD {
        return Err(CoreError::Validation(format!(
            "Upload limit exceeded: maximum {MAX_PHOTOS_PER_UPLOAD} photos per upload"
        )));
    }
    Ok(())
}

/// Lower-case extension (with dot) of an accepted photo file name.
pub fn check_photo_file(file_name: &str, size: usize) -> Result<String, CoreError> {
    let ext = file_name
        .rfind('.')
        .map(|i| file_name[i..].to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Invalid file type for '{file_name}'. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if size > MAX_PHOTO_SIZE_BYTES {
        return Err(CoreError::Validation(format!(
            "File '{file_name}' is too large. Maximum size is 15MB"
        )));
    }
    Ok(ext)
}

/// Public URL of a stored upload.
pub fn photo_url(vehicle_id: i64, file_name: &str) -> String {
    format!("{PHOTO_URL_PREFIX}/{vehicle_id}/{file_name}")
}

/// Append newly uploaded images. When the vehicle had no primary image
/// the first new one becomes primary.
pub fn append_photos(images: &mut Vec<StoredImage>, mut new_images: Vec<StoredImage>) {
    let has_primary = images.iter().any(|img| img.is_primary);
    for img in new_images.iter_mut() {
        img.is_primary = false;
    }
    if !has_primary {
        if let Some(first) = images.first_mut().or(new_images.first_mut()) {
            first.is_primary = true;
        }
    }
    images.extend(new_images);
}

/// Make `upload_id` the only primary image.
pub fn set_primary(images: &mut [StoredImage], upload_id: &str) -> Result<(), CoreError> {
    if !images.iter().any(|img| img.upload_id == upload_id) {
        return Err(CoreError::not_found("Photo", upload_id));
    }
    for img in images.iter_mut() {
        img.is_primary = img.upload_id == upload_id;
    }
    Ok(())
}

/// Remove a photo by upload id. Removing the primary promotes the next
/// remaining image (or the previous one when it was last).
pub fn remove_photo(
    images: &mut Vec<StoredImage>,
    upload_id: &str,
) -> Result<StoredImage, CoreError> {
    let idx = images
        .iter()
        .position(|img| img.upload_id == upload_id)
        .ok_or_else(|| CoreError::not_found("Photo", upload_id))?;
    let removed = images.remove(idx);
    if removed.is_primary && !images.is_empty() {
        let promote = idx.min(images.len() - 1);
        images[promote].is_primary = true;
    }
    Ok(removed)
}

/// URL of the primary image, else the first image.
pub fn primary_url(images: &[StoredImage]) -> Option<&str> {
    images
        .iter()
        .find(|img| img.is_primary)
        .or_else(|| images.first())
        .map(|img| img.url.as_str())
}
