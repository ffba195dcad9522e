//! Processing and on-disk storage of vehicle photos.
//!
//! Every upload is decoded, turned upright from its EXIF orientation,
//! flattened onto white, scaled into the photo box and re-encoded as JPEG,
//! with a second JPEG for the thumbnail box.
//!
//! Layout: `<upload_dir>/<vehicle_id>/<upload_id>.jpg` plus
//! `<upload_id>_thumb.jpg`, served at `/admin-vehicles/<vehicle_id>/...`.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chooseme_core::images::StoredImage;
use chooseme_core::photos::{
    photo_url, PHOTO_JPEG_QUALITY, PHOTO_MAX_HEIGHT, PHOTO_MAX_WIDTH, PHOTO_URL_PREFIX,
    THUMBNAIL_JPEG_QUALITY, THUMBNAIL_MAX_HEIGHT, THUMBNAIL_MAX_WIDTH,
};
use chooseme_core::types::DbId;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult, Rgb, RgbImage};

use crate::error::{AppError, AppResult};

/// Re-encoded photo and thumbnail, both JPEG.
#[derive(Debug)]
pub struct ProcessedPhoto {
    pub photo: Vec<u8>,
    pub thumbnail: Vec<u8>,
}

/// Decode `bytes` and apply the EXIF orientation, if any.
fn decode_upright(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Composite transparent pixels onto a white background.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Scale down to fit `max_width` x `max_height`, keeping the aspect ratio.
/// Images already inside the box are returned unchanged.
fn fit_within(img: RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    if img.width() <= max_width && img.height() <= max_height {
        return img;
    }
    DynamicImage::ImageRgb8(img)
        .resize(max_width, max_height, FilterType::Lanczos3)
        .into_rgb8()
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
    Ok(out)
}

/// Run an uploaded file through the photo pipeline.
pub fn process_photo(bytes: &[u8]) -> ImageResult<ProcessedPhoto> {
    let img = decode_upright(bytes)?;
    let photo = fit_within(flatten_onto_white(&img), PHOTO_MAX_WIDTH, PHOTO_MAX_HEIGHT);
    let thumbnail = fit_within(photo.clone(), THUMBNAIL_MAX_WIDTH, THUMBNAIL_MAX_HEIGHT);
    Ok(ProcessedPhoto {
        photo: encode_jpeg(&photo, PHOTO_JPEG_QUALITY)?,
        thumbnail: encode_jpeg(&thumbnail, THUMBNAIL_JPEG_QUALITY)?,
    })
}

fn vehicle_dir(upload_dir: &Path, vehicle_id: DbId) -> PathBuf {
    upload_dir.join(vehicle_id.to_string())
}

/// Process and write one photo. The returned image is not yet attached to
/// the vehicle.
pub async fn save_photo(
    upload_dir: &Path,
    vehicle_id: DbId,
    original_filename: &str,
    bytes: Vec<u8>,
) -> AppResult<StoredImage> {
    let processed = tokio::task::spawn_blocking(move || process_photo(&bytes))
        .await
        .map_err(|e| AppError::InternalError(format!("Photo processing task failed: {e}")))?
        .map_err(|_| {
            AppError::BadRequest(format!("File '{original_filename}' is not a valid image"))
        })?;

    let dir = vehicle_dir(upload_dir, vehicle_id);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot create upload dir: {e}")))?;

    let upload_id = uuid::Uuid::new_v4().simple().to_string();
    let file_name = format!("{upload_id}.jpg");
    let thumb_name = format!("{upload_id}_thumb.jpg");

    tokio::fs::write(dir.join(&file_name), &processed.photo)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot write photo: {e}")))?;
    tokio::fs::write(dir.join(&thumb_name), &processed.thumbnail)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot write thumbnail: {e}")))?;

    Ok(StoredImage {
        upload_id,
        url: photo_url(vehicle_id, &file_name),
        thumbnail_url: Some(photo_url(vehicle_id, &thumb_name)),
        is_primary: false,
        original_filename: Some(original_filename.to_string()),
    })
}

/// Map a served URL back to its file, when it points into the upload dir.
pub fn local_path(upload_dir: &Path, url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix(PHOTO_URL_PREFIX)?.trim_start_matches('/');
    if rest.is_empty() || rest.split('/').any(|seg| seg == ".." || seg.is_empty()) {
        return None;
    }
    Some(upload_dir.join(rest))
}

/// Remove a photo and its thumbnail from disk. Missing files and external
/// URLs are ignored; IO errors are logged.
pub async fn remove_photo_files(upload_dir: &Path, image: &StoredImage) {
    let urls = std::iter::once(image.url.as_str()).chain(image.thumbnail_url.as_deref());
    for path in urls.filter_map(|u| local_path(upload_dir, u)) {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not delete photo file"),
        }
    }
}

/// Remove a vehicle's whole photo directory.
pub async fn remove_vehicle_dir(upload_dir: &Path, vehicle_id: DbId) {
    let dir = vehicle_dir(upload_dir, vehicle_id);
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "Could not delete photo directory"),
    }
}
