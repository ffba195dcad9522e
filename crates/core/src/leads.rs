//! Lead types, statuses, and inbound lead payload validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// Source tag recorded on every lead captured by the public site.
pub const LEAD_SOURCE_WEBSITE: &str = "choose-me-auto-website";

/// Kind of enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadType {
    Contact,
    PreApproval,
    TestDrive,
    Availability,
    Hold,
}

impl LeadType {
    pub const ALL: [LeadType; 5] = [
        Self::Contact,
        Self::PreApproval,
        Self::TestDrive,
        Self::Availability,
        Self::Hold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::PreApproval => "pre_approval",
            Self::TestDrive => "test_drive",
            Self::Availability => "availability",
            Self::Hold => "hold",
        }
    }

    /// Human label used in alert subjects.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::PreApproval => "Pre-Approval",
            Self::TestDrive => "Test Drive",
            Self::Availability => "Availability",
            Self::Hold => "Hold",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown lead type '{s}'")))
    }
}

/// Sales pipeline position of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Converted,
        Self::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown lead status '{s}'")))
    }
}

/// How the customer wants to be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPreference {
    #[default]
    Text,
    Call,
    Email,
}

impl ContactPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Call => "call",
            Self::Email => "email",
        }
    }
}

/// `"Call for availability & price"` form on a vehicle page.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleLeadInput {
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 7, max = 30, message = "must be 7 to 30 characters"))]
    pub phone: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_preference: ContactPreference,
    pub message: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub stock_id: String,
    #[validate(length(min = 1, message = "is required"))]
    pub vin: String,
    #[validate(length(min = 1, message = "is required"))]
    pub vehicle_summary: String,
}

/// Generic lead from the contact, pre-approval, test-drive and hold forms.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LeadInput {
    pub lead_type: LeadType,
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(min = 7, max = 30, message = "must be 7 to 30 characters"))]
    pub phone: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_preference: ContactPreference,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub message: Option<String>,
    pub stock_id: Option<String>,
    pub vin: Option<String>,
    pub vehicle_summary: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    /// Form-specific extras (employment, trade-in, ...), stored verbatim.
    pub details: Option<serde_json::Value>,
}

/// Browsers submit untouched optional inputs as `""`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Split a full name into first and last at the first whitespace run.
pub fn split_name(full: &str) -> (String, Option<String>) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) if !rest.trim().is_empty() => {
            (first.to_string(), Some(rest.trim().to_string()))
        }
        _ => (full.to_string(), None),
    }
}

impl From<VehicleLeadInput> for LeadInput {
    fn from(v: VehicleLeadInput) -> Self {
        let (first_name, last_name) = split_name(&v.name);
        Self {
            lead_type: LeadType::Availability,
            first_name,
            last_name,
            phone: v.phone.trim().to_string(),
            email: v.email.filter(|e| !e.trim().is_empty()),
            contact_preference: v.contact_preference,
            message: v.message.filter(|m| !m.trim().is_empty()),
            stock_id: Some(v.stock_id),
            vin: Some(v.vin.to_uppercase()),
            vehicle_summary: Some(v.vehicle_summary),
            preferred_date: None,
            preferred_time: None,
            details: None,
        }
    }
}

/// `"Maria G."` for alert subjects; just the first name when no last name.
pub fn name_with_initial(first_name: &str, last_name: Option<&str>) -> String {
    match last_name.and_then(|l| l.trim().chars().next()) {
        Some(initial) => format!("{first_name} {initial}."),
        None => first_name.to_string(),
    }
}

/// Aggregate lead counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadStats {
    pub total: i64,
    pub new: i64,
    pub by_type: BTreeMap<String, i64>,
}

impl LeadStats {
    /// Build from `(lead_type, status, count)` groups.
    pub fn from_groups<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, i64)>,
    {
        let mut stats = Self::default();
        for (lead_type, status, count) in groups {
            stats.total += count;
            if status == LeadStatus::New.as_str() {
                stats.new += count;
            }
            *stats.by_type.entry(lead_type.to_string()).or_default() += count;
        }
        stats
    }
}
