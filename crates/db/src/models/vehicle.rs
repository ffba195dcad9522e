//! Vehicle inventory model and its public projections.

use chooseme_core::csv_import::ImportVehicle;
use chooseme_core::images::{
    migrate_legacy_photo_urls, normalize_images, NormalizedImage, RawImage, StoredImage,
};
use chooseme_core::types::{DbId, Timestamp};
use chooseme_core::vehicle::vehicle_summary;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `vehicles` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vehicle {
    pub id: DbId,
    pub vin: String,
    pub stock_number: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub price: i64,
    pub mileage: Option<i64>,
    pub condition: String,
    pub body_style: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub engine: Option<String>,
    pub fuel_type: Option<String>,
    pub carfax_url: Option<String>,
    pub window_sticker_url: Option<String>,
    pub call_for_availability_enabled: bool,
    pub is_featured: bool,
    pub is_featured_homepage: bool,
    pub featured_rank: Option<i32>,
    pub is_active: bool,
    pub images: Json<Vec<StoredImage>>,
    pub photo_urls: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Vehicle {
    /// Stored images, or the legacy `photo_urls` converted on the fly when
    /// the vehicle predates structured images.
    pub fn stored_images(&self) -> Vec<StoredImage> {
        if self.images.0.is_empty() && !self.photo_urls.is_empty() {
            migrate_legacy_photo_urls(&self.photo_urls)
        } else {
            self.images.0.clone()
        }
    }

    /// Images ready for the gallery: one URL per role and a stable id.
    pub fn normalized_images(&self) -> Vec<NormalizedImage> {
        let raw: Vec<RawImage> = if self.images.0.is_empty() {
            self.photo_urls.iter().cloned().map(RawImage::Url).collect()
        } else {
            self.images.0.iter().map(RawImage::from).collect()
        };
        normalize_images(raw).images
    }

    pub fn primary_image_url(&self) -> Option<String> {
        let images = self.normalized_images();
        chooseme_core::images::primary_of(&images).map(|img| img.display_url.clone())
    }

    pub fn summary(&self) -> String {
        vehicle_summary(Some(self.year), &self.make, &self.model, self.trim.as_deref())
    }
}

/// Inventory card shape used by the public list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleListItem {
    pub id: DbId,
    pub stock_id: String,
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub price: i64,
    pub mileage: Option<i64>,
    pub primary_image_url: Option<String>,
    pub body_style: Option<String>,
    pub condition: String,
}

impl From<&Vehicle> for VehicleListItem {
    fn from(v: &Vehicle) -> Self {
        Self {
            id: v.id,
            stock_id: v.stock_number.clone(),
            vin: v.vin.clone(),
            year: v.year,
            make: v.make.clone(),
            model: v.model.clone(),
            trim: v.trim.clone(),
            price: v.price,
            mileage: v.mileage,
            primary_image_url: v.primary_image_url(),
            body_style: v.body_style.clone(),
            condition: v.condition.clone(),
        }
    }
}

/// Vehicle detail page shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleDetail {
    #[serde(flatten)]
    pub summary: VehicleListItem,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub engine: Option<String>,
    pub fuel_type: Option<String>,
    pub carfax_url: Option<String>,
    pub window_sticker_url: Option<String>,
    pub call_for_availability_enabled: bool,
    pub images: Vec<NormalizedImage>,
    /// Display URLs in gallery order, for consumers that only want strings.
    pub photo_urls: Vec<String>,
}

impl From<&Vehicle> for VehicleDetail {
    fn from(v: &Vehicle) -> Self {
        let images = v.normalized_images();
        Self {
            summary: VehicleListItem::from(v),
            exterior_color: v.exterior_color.clone(),
            interior_color: v.interior_color.clone(),
            transmission: v.transmission.clone(),
            drivetrain: v.drivetrain.clone(),
            engine: v.engine.clone(),
            fuel_type: v.fuel_type.clone(),
            carfax_url: v.carfax_url.clone(),
            window_sticker_url: v.window_sticker_url.clone(),
            call_for_availability_enabled: v.call_for_availability_enabled,
            photo_urls: images.iter().map(|i| i.display_url.clone()).collect(),
            images,
        }
    }
}

/// DTO for creating a vehicle.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateVehicle {
    pub vin: String,
    pub stock_number: Option<String>,
    pub year: i32,
    #[validate(length(min = 1, message = "is required"))]
    pub make: String,
    #[validate(length(min = 1, message = "is required"))]
    pub model: String,
    pub trim: Option<String>,
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub price: i64,
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub mileage: Option<i64>,
    pub condition: Option<String>,
    pub body_style: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub engine: Option<String>,
    pub fuel_type: Option<String>,
    pub carfax_url: Option<String>,
    pub window_sticker_url: Option<String>,
    pub call_for_availability_enabled: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_featured_homepage: Option<bool>,
    pub featured_rank: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub images: Vec<StoredImage>,
}

/// DTO for a partial vehicle update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVehicle {
    pub stock_number: Option<String>,
    pub year: Option<i32>,
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub make: Option<String>,
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub model: Option<String>,
    pub trim: Option<String>,
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub price: Option<i64>,
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub mileage: Option<i64>,
    pub condition: Option<String>,
    pub body_style: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub engine: Option<String>,
    pub fuel_type: Option<String>,
    pub carfax_url: Option<String>,
    pub window_sticker_url: Option<String>,
    pub call_for_availability_enabled: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_featured_homepage: Option<bool>,
    pub featured_rank: Option<i32>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<StoredImage>>,
}

fn import_images(urls: &[String]) -> Vec<StoredImage> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| StoredImage::from_url(url.clone(), i == 0))
        .collect()
}

impl From<&ImportVehicle> for CreateVehicle {
    fn from(row: &ImportVehicle) -> Self {
        Self {
            vin: row.vin.clone(),
            stock_number: row.stock_number.clone(),
            year: row.year,
            make: row.make.clone(),
            model: row.model.clone(),
            trim: row.trim.clone(),
            price: row.price,
            mileage: row.mileage,
            condition: row.condition.map(|c| c.as_str().to_string()),
            body_style: row.body_style.clone(),
            exterior_color: row.exterior_color.clone(),
            interior_color: row.interior_color.clone(),
            transmission: row.transmission.clone(),
            drivetrain: row.drivetrain.clone(),
            engine: row.engine.clone(),
            fuel_type: row.fuel_type.clone(),
            carfax_url: row.carfax_url.clone(),
            window_sticker_url: row.window_sticker_url.clone(),
            call_for_availability_enabled: row.call_for_availability_enabled,
            is_featured: None,
            is_featured_homepage: row.is_featured_homepage,
            featured_rank: row.featured_rank,
            is_active: row.is_active,
            images: import_images(&row.image_urls),
        }
    }
}

impl From<&ImportVehicle> for UpdateVehicle {
    fn from(row: &ImportVehicle) -> Self {
        let create = CreateVehicle::from(row);
        Self {
            stock_number: create.stock_number,
            year: Some(create.year),
            make: Some(create.make),
            model: Some(create.model),
            trim: create.trim,
            price: Some(create.price),
            mileage: create.mileage,
            condition: create.condition,
            body_style: create.body_style,
            exterior_color: create.exterior_color,
            interior_color: create.interior_color,
            transmission: create.transmission,
            drivetrain: create.drivetrain,
            engine: create.engine,
            fuel_type: create.fuel_type,
            carfax_url: create.carfax_url,
            window_sticker_url: create.window_sticker_url,
            call_for_availability_enabled: create.call_for_availability_enabled,
            is_featured: None,
            is_featured_homepage: create.is_featured_homepage,
            featured_rank: create.featured_rank,
            is_active: create.is_active,
            images: Some(create.images).filter(|imgs| !imgs.is_empty()),
        }
    }
}

/// Public inventory filters. Text filters match case-insensitively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilter {
    pub make: Option<String>,
    pub model: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub body_style: Option<String>,
    pub condition: Option<String>,
}
