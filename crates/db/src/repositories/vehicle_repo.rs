//! Repository for the `vehicles` table.

use std::collections::HashSet;

use chooseme_core::images::StoredImage;
use chooseme_core::types::DbId;
use chooseme_core::vehicle::Condition;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle, VehicleFilter};

/// Column list for vehicles queries.
const COLUMNS: &str = "id, vin, stock_number, year, make, model, trim, price, mileage, \
    condition, body_style, exterior_color, interior_color, transmission, drivetrain, \
    engine, fuel_type, carfax_url, window_sticker_url, call_for_availability_enabled, \
    is_featured, is_featured_homepage, featured_rank, is_active, images, photo_urls, \
    created_at, updated_at";

/// Admin inventory list cap.
pub const ADMIN_LIST_LIMIT: i64 = 500;

/// Featured list bounds.
pub const DEFAULT_FEATURED_LIMIT: i64 = 8;
pub const MAX_FEATURED_LIMIT: i64 = 24;

/// Clamp a requested featured count into `1..=MAX_FEATURED_LIMIT`.
pub fn clamp_featured_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_FEATURED_LIMIT)
        .clamp(1, MAX_FEATURED_LIMIT)
}

fn normalize_condition(raw: Option<&str>) -> Option<&'static str> {
    raw.map(|c| Condition::parse_lenient(c).as_str())
}

/// Provides CRUD operations for vehicles.
pub struct VehicleRepo;

impl VehicleRepo {
    /// Insert a vehicle. `stock_number` must already be resolved.
    pub async fn create(
        pool: &PgPool,
        input: &CreateVehicle,
        stock_number: &str,
    ) -> Result<Vehicle, sqlx::Error> {
        let condition = normalize_condition(input.condition.as_deref()).unwrap_or("Used");
        let query = format!(
            "INSERT INTO vehicles
                (vin, stock_number, year, make, model, trim, price, mileage, condition,
                 body_style, exterior_color, interior_color, transmission, drivetrain,
                 engine, fuel_type, carfax_url, window_sticker_url,
                 call_for_availability_enabled, is_featured, is_featured_homepage,
                 featured_rank, is_active, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                     $17, $18, COALESCE($19, FALSE), COALESCE($20, FALSE),
                     COALESCE($21, FALSE), $22, COALESCE($23, TRUE), $24)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(&input.vin)
            .bind(stock_number)
            .bind(input.year)
            .bind(&input.make)
            .bind(&input.model)
            .bind(&input.trim)
            .bind(input.price)
            .bind(input.mileage)
            .bind(condition)
            .bind(&input.body_style)
            .bind(&input.exterior_color)
            .bind(&input.interior_color)
            .bind(&input.transmission)
            .bind(&input.drivetrain)
            .bind(&input.engine)
            .bind(&input.fuel_type)
            .bind(&input.carfax_url)
            .bind(&input.window_sticker_url)
            .bind(input.call_for_availability_enabled)
            .bind(input.is_featured)
            .bind(input.is_featured_homepage)
            .bind(input.featured_rank)
            .bind(input.is_active)
            .bind(Json(&input.images))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vehicles WHERE id = $1");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an active vehicle by its stock number (the public `stock_id`).
    pub async fn find_active_by_stock_number(
        pool: &PgPool,
        stock_number: &str,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vehicles WHERE stock_number = $1 AND is_active = TRUE"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(stock_number)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_vin(pool: &PgPool, vin: &str) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vehicles WHERE vin = $1");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(vin)
            .fetch_optional(pool)
            .await
    }

    /// Which of the given (upper-case) VINs are already in inventory.
    pub async fn existing_vins(
        pool: &PgPool,
        vins: &[String],
    ) -> Result<HashSet<String>, sqlx::Error> {
        if vins.is_empty() {
            return Ok(HashSet::new());
        }
        let rows: Vec<(String,)> = sqlx::query_as("SELECT vin FROM vehicles WHERE vin = ANY($1)")
            .bind(vins)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(vin,)| vin).collect())
    }

    /// Admin inventory: every vehicle, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Vehicle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vehicles
             ORDER BY created_at DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(ADMIN_LIST_LIMIT)
            .fetch_all(pool)
            .await
    }

    /// Public inventory: active vehicles matching the filters, newest first.
    pub async fn list_active(
        pool: &PgPool,
        filter: &VehicleFilter,
    ) -> Result<Vec<Vehicle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vehicles
             WHERE is_active = TRUE
               AND ($1::TEXT IS NULL OR LOWER(make) = LOWER($1))
               AND ($2::TEXT IS NULL OR LOWER(model) = LOWER($2))
               AND ($3::BIGINT IS NULL OR price >= $3)
               AND ($4::BIGINT IS NULL OR price <= $4)
               AND ($5::TEXT IS NULL OR LOWER(body_style) = LOWER($5))
               AND ($6::TEXT IS NULL OR LOWER(condition) = LOWER($6))
             ORDER BY created_at DESC, id DESC"
        );
        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(non_empty(&filter.make))
            .bind(non_empty(&filter.model))
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(non_empty(&filter.body_style))
            .bind(non_empty(&filter.condition))
            .fetch_all(pool)
            .await
    }

    /// Homepage featured vehicles: ranked first (nulls last), then newest.
    pub async fn list_featured(pool: &PgPool, limit: i64) -> Result<Vec<Vehicle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vehicles
             WHERE is_active = TRUE AND is_featured_homepage = TRUE
             ORDER BY featured_rank ASC NULLS LAST, created_at DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Partial update. Returns `None` when the vehicle does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVehicle,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!(
            "UPDATE vehicles SET
                stock_number = COALESCE($2, stock_number),
                year = COALESCE($3, year),
                make = COALESCE($4, make),
                model = COALESCE($5, model),
                trim = COALESCE($6, trim),
                price = COALESCE($7, price),
                mileage = COALESCE($8, mileage),
                condition = COALESCE($9, condition),
                body_style = COALESCE($10, body_style),
                exterior_color = COALESCE($11, exterior_color),
                interior_color = COALESCE($12, interior_color),
                transmission = COALESCE($13, transmission),
                drivetrain = COALESCE($14, drivetrain),
                engine = COALESCE($15, engine),
                fuel_type = COALESCE($16, fuel_type),
                carfax_url = COALESCE($17, carfax_url),
                window_sticker_url = COALESCE($18, window_sticker_url),
                call_for_availability_enabled = COALESCE($19, call_for_availability_enabled),
                is_featured = COALESCE($20, is_featured),
                is_featured_homepage = COALESCE($21, is_featured_homepage),
                featured_rank = COALESCE($22, featured_rank),
                is_active = COALESCE($23, is_active),
                images = COALESCE($24, images)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .bind(&input.stock_number)
            .bind(input.year)
            .bind(&input.make)
            .bind(&input.model)
            .bind(&input.trim)
            .bind(input.price)
            .bind(input.mileage)
            .bind(normalize_condition(input.condition.as_deref()))
            .bind(&input.body_style)
            .bind(&input.exterior_color)
            .bind(&input.interior_color)
            .bind(&input.transmission)
            .bind(&input.drivetrain)
            .bind(&input.engine)
            .bind(&input.fuel_type)
            .bind(&input.carfax_url)
            .bind(&input.window_sticker_url)
            .bind(input.call_for_availability_enabled)
            .bind(input.is_featured)
            .bind(input.is_featured_homepage)
            .bind(input.featured_rank)
            .bind(input.is_active)
            .bind(input.images.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Partial update keyed by VIN, used by the CSV importer.
    pub async fn update_by_vin(
        pool: &PgPool,
        vin: &str,
        input: &UpdateVehicle,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let Some(existing) = Self::find_by_vin(pool, vin).await? else {
            return Ok(None);
        };
        Self::update(pool, existing.id, input).await
    }

    /// Replace the image list. Clears legacy `photo_urls`, which the new
    /// list supersedes.
    pub async fn set_images(
        pool: &PgPool,
        id: DbId,
        images: &[StoredImage],
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!(
            "UPDATE vehicles SET images = $2, photo_urls = '{{}}'
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .bind(Json(images))
            .fetch_optional(pool)
            .await
    }

    /// Delete a vehicle. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn featured_limit_is_clamped() {
        assert_eq!(clamp_featured_limit(None), 8);
        assert_eq!(clamp_featured_limit(Some(0)), 1);
        assert_eq!(clamp_featured_limit(Some(-3)), 1);
        assert_eq!(clamp_featured_limit(Some(12)), 12);
        assert_eq!(clamp_featured_limit(Some(500)), 24);
    }

    #[test]
    fn condition_is_normalized_before_binding() {
        assert_eq!(normalize_condition(Some("nuevo")), Some("New"));
        assert_eq!(normalize_condition(Some("pre-owned")), Some("Used"));
        assert_eq!(normalize_condition(None), None);
    }
}
