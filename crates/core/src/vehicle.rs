//! Vehicle identity rules: VIN format, stock numbers, condition labels.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix for dealer-generated stock numbers.
pub const STOCK_NUMBER_PREFIX: &str = "CMA";

/// Required VIN length.
pub const VIN_LENGTH: usize = 17;

/// 17 alphanumerics, excluding I, O and Q.
static VIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("valid VIN regex"));

/// New or used. Stored and serialized as `"New"` / `"Used"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Condition {
    New,
    #[default]
    Used,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Used => "Used",
        }
    }

    /// Lenient parse used by the CSV importer and admin forms.
    ///
    /// Anything that is not recognisably "new" is treated as used.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "new" | "nuevo" => Self::New,
            _ => Self::Used,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate and normalize a VIN. Returns the upper-cased VIN on success or
/// a human-readable reason on failure.
pub fn validate_vin(raw: &str) -> Result<String, String> {
    let vin = raw.trim().to_uppercase();
    if vin.is_empty() {
        return Err("VIN is required".to_string());
    }
    let len = vin.chars().count();
    if len != VIN_LENGTH {
        return Err(format!("VIN must be {VIN_LENGTH} characters (got {len})"));
    }
    if !VIN_RE.is_match(&vin) {
        return Err("VIN contains invalid characters".to_string());
    }
    Ok(vin)
}

/// Generate a dealer stock number such as `CMA3F9A1C`.
pub fn generate_stock_number() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{STOCK_NUMBER_PREFIX}{}", hex[..6].to_uppercase())
}

/// Human summary used in lead payloads and import previews, e.g.
/// `"2022 Chevrolet Malibu LT"`. Missing parts are skipped.
pub fn vehicle_summary(year: Option<i32>, make: &str, model: &str, trim: Option<&str>) -> String {
    let year = year.map(|y| y.to_string());
    [year.as_deref(), Some(make), Some(model), trim]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_vin_is_uppercased() {
        assert_eq!(
            validate_vin(" 1hgcm82633a123456 ").unwrap(),
            "1HGCM82633A123456"
        );
    }

    #[test]
    fn vin_with_wrong_length_is_rejected() {
        let err = validate_vin("S02TEST123456789").unwrap_err();
        assert_eq!(err, "VIN must be 17 characters (got 16)");
    }

    #[test]
    fn vin_with_forbidden_letters_is_rejected() {
        // 'O' is not allowed.
        let err = validate_vin("1HGCM82633A12345O").unwrap_err();
        assert_eq!(err, "VIN contains invalid characters");
    }

    #[test]
    fn empty_vin_is_required() {
        assert_eq!(validate_vin("   ").unwrap_err(), "VIN is required");
    }

    #[test]
    fn condition_parsing() {
        assert_eq!(Condition::parse_lenient("NEW"), Condition::New);
        assert_eq!(Condition::parse_lenient("nuevo"), Condition::New);
        assert_eq!(Condition::parse_lenient("Pre-Owned"), Condition::Used);
        assert_eq!(Condition::parse_lenient("usado"), Condition::Used);
        assert_eq!(Condition::parse_lenient("salvage"), Condition::Used);
    }

    #[test]
    fn stock_number_shape() {
        let stock = generate_stock_number();
        assert!(stock.starts_with(STOCK_NUMBER_PREFIX));
        assert_eq!(stock.len(), 9);
        assert!(stock[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn summary_skips_missing_parts() {
        assert_eq!(
            vehicle_summary(Some(2022), "Chevrolet", "Malibu", Some("LT")),
            "2022 Chevrolet Malibu LT"
        );
        assert_eq!(vehicle_summary(None, "Honda", "Accord", Some("")), "Honda Accord");
    }
}
