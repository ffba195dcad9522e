//! Customer lead model.

use chooseme_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `leads` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: DbId,
    pub lead_type: String,
    pub status: String,
    pub source: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub contact_preference: String,
    pub message: Option<String>,
    pub stock_id: Option<String>,
    pub vin: Option<String>,
    pub vehicle_summary: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Lead {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().filter(|l| !l.is_empty()) {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

/// Admin list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub lead_type: Option<String>,
}

/// DTO for a lead status change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLeadStatus {
    pub status: String,
}
