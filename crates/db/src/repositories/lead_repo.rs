//! Repository for the `leads` table.

use chooseme_core::leads::{LeadInput, LeadStats, LEAD_SOURCE_WEBSITE};
use chooseme_core::types::DbId;
use sqlx::PgPool;

use crate::models::lead::{Lead, LeadFilter};

/// Column list for leads queries.
const COLUMNS: &str = "id, lead_type, status, source, first_name, last_name, phone, email, \
    contact_preference, message, stock_id, vin, vehicle_summary, preferred_date, \
    preferred_time, details, created_at, updated_at";

/// Provides CRUD operations for leads.
pub struct LeadRepo;

impl LeadRepo {
    /// Insert a new lead with status `new`.
    pub async fn create(pool: &PgPool, input: &LeadInput) -> Result<Lead, sqlx::Error> {
        let query = format!(
            "INSERT INTO leads
                (lead_type, source, first_name, last_name, phone, email, contact_preference,
                 message, stock_id, vin, vehicle_summary, preferred_date, preferred_time, details)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(input.lead_type.as_str())
            .bind(LEAD_SOURCE_WEBSITE)
            .bind(input.first_name.trim())
            .bind(input.last_name.as_deref().map(str::trim))
            .bind(input.phone.trim())
            .bind(&input.email)
            .bind(input.contact_preference.as_str())
            .bind(&input.message)
            .bind(&input.stock_id)
            .bind(&input.vin)
            .bind(&input.vehicle_summary)
            .bind(&input.preferred_date)
            .bind(&input.preferred_time)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads WHERE id = $1");
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List leads, newest first, optionally filtered by status and type.
    pub async fn list(pool: &PgPool, filter: &LeadFilter) -> Result<Vec<Lead>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM leads
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::TEXT IS NULL OR lead_type = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(&filter.status)
            .bind(&filter.lead_type)
            .fetch_all(pool)
            .await
    }

    /// Set the status. Returns `None` when the lead does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!(
            "UPDATE leads SET status = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a lead. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Totals for the admin dashboard.
    pub async fn stats(pool: &PgPool) -> Result<LeadStats, sqlx::Error> {
        let groups: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT lead_type, status, COUNT(*)::BIGINT
             FROM leads
             GROUP BY lead_type, status",
        )
        .fetch_all(pool)
        .await?;
        Ok(LeadStats::from_groups(
            groups
                .iter()
                .map(|(t, s, n)| (t.as_str(), s.as_str(), *n)),
        ))
    }
}
