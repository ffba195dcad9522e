//! CSV inventory import: parsing, row validation, and create/update/skip
//! partitioning.
//!
//! The server runs the same pipeline for a dry run and for a commit. A dry
//! run stops after [`ImportPlan::report`]; a commit then applies
//! [`ImportPlan::rows_to_apply`] and records the outcome on the report.

use std::collections::{HashMap, HashSet};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::vehicle::{validate_vin, vehicle_summary, Condition};

/// Maximum accepted upload size in bytes (5 MiB).
pub const MAX_CSV_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Maximum number of rows echoed in the preview table.
pub const MAX_PREVIEW_ROWS: usize = 20;

/// Columns every import file must carry.
pub const REQUIRED_COLUMNS: &[&str] = &["vin", "year", "make", "model", "price"];

/// Columns the importer understands. Others are ignored.
pub const SUPPORTED_COLUMNS: &[&str] = &[
    "vin",
    "year",
    "make",
    "model",
    "price",
    "trim",
    "mileage",
    "stock_number",
    "condition",
    "exterior_color",
    "interior_color",
    "transmission",
    "drivetrain",
    "fuel_type",
    "body_style",
    "engine",
    "carfax_url",
    "window_sticker_url",
    "primary_image_url",
    "image_urls",
    "is_featured_homepage",
    "featured_rank",
    "call_for_availability_enabled",
    "is_active",
];

/// Download name of the import template.
pub const TEMPLATE_FILENAME: &str = "vehicle_import_template.csv";

const TEMPLATE_HEADERS: &[&str] = &[
    "vin",
    "year",
    "make",
    "model",
    "price",
    "trim",
    "mileage",
    "stock_number",
    "condition",
    "exterior_color",
    "interior_color",
    "transmission",
    "drivetrain",
    "body_style",
    "carfax_url",
    "primary_image_url",
    "image_urls",
    "is_featured_homepage",
    "featured_rank",
];

const TEMPLATE_SAMPLE_ROW: &[&str] = &[
    "1HGCM82633A123456",
    "2024",
    "Honda",
    "Accord",
    "32500",
    "Sport",
    "15000",
    "CMA001",
    "Used",
    "Black",
    "Black",
    "Automatic",
    "FWD",
    "Sedan",
    "",
    "",
    "",
    "false",
    "",
];

const EARLIEST_MODEL_YEAR: i32 = 1900;

/// File-level import failures. Row-level problems never produce these;
/// they become skipped rows instead.
#[derive(Debug, thiserror::Error)]
pub enum CsvImportError {
    #[error("Please select a CSV file")]
    NotCsvFile,

    #[error("File too large. Maximum size is 5MB")]
    TooLarge,

    #[error("CSV file has no headers")]
    NoHeaders,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV file contains no data rows")]
    NoDataRows,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<CsvImportError> for CoreError {
    fn from(err: CsvImportError) -> Self {
        match err {
            CsvImportError::Csv(e) => CoreError::Internal(format!("CSV error: {e}")),
            other => CoreError::Validation(other.to_string()),
        }
    }
}

/// Client-side gate run before any upload: extension and size only.
pub fn check_upload(file_name: &str, size: usize) -> Result<(), CsvImportError> {
    if !file_name.to_lowercase().ends_with(".csv") {
        return Err(CsvImportError::NotCsvFile);
    }
    if size > MAX_CSV_SIZE_BYTES {
        return Err(CsvImportError::TooLarge);
    }
    Ok(())
}

// ── Parsing ──────────────────────────────────────────────────────────

/// One data row keyed by normalized header.
#[derive(Debug, Clone)]
pub struct CsvRow {
    /// 1-based source line; the header is line 1.
    pub line: usize,
    pub fields: HashMap<String, String>,
}

impl CsvRow {
    /// Trimmed value of a column; empty cells read as `None`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Parsed file: normalized headers plus rows in source order.
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
    /// Records the reader could not split, as `(line, message)`.
    pub malformed: Vec<(usize, String)>,
}

impl ParsedCsv {
    pub fn total_rows(&self) -> usize {
        self.rows.len() + self.malformed.len()
    }

    /// Upper-cased VINs of every row that has one. Used to look up which
    /// vehicles already exist before planning.
    pub fn candidate_vins(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|r| r.get("vin"))
            .map(|v| v.to_uppercase())
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }
}

/// Lower-case, trim and underscore a header cell.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Decode as UTF-8 (BOM stripped), falling back to Latin-1.
pub fn decode_csv(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse raw upload bytes into rows keyed by normalized header.
pub fn parse_csv_content(bytes: &[u8]) -> Result<ParsedCsv, CsvImportError> {
    if bytes.len() > MAX_CSV_SIZE_BYTES {
        return Err(CsvImportError::TooLarge);
    }
    let text = decode_csv(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvImportError::NoHeaders);
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvImportError::MissingColumns(missing));
    }

    let ignored: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .filter(|h| !h.is_empty() && !SUPPORTED_COLUMNS.contains(h))
        .collect();
    if !ignored.is_empty() {
        tracing::debug!(columns = ?ignored, "Ignoring unsupported CSV columns");
    }

    let mut rows = Vec::new();
    let mut malformed = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 2);
                let fields = headers
                    .iter()
                    .zip(record.iter())
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect();
                rows.push(CsvRow { line, fields });
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 2);
                malformed.push((line, e.to_string()));
            }
        }
    }

    if rows.is_empty() && malformed.is_empty() {
        return Err(CsvImportError::NoDataRows);
    }

    Ok(ParsedCsv {
        headers,
        rows,
        malformed,
    })
}

// ── Field normalization ──────────────────────────────────────────────

/// Parse a number after stripping `$`, `,` and whitespace. Fractions are
/// truncated toward zero.
pub fn normalize_number(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

/// `true/1/yes/y` and `false/0/no/n`, case-insensitive.
pub fn normalize_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Split an `image_urls` cell: JSON array, `|`-separated, or a single URL.
pub fn parse_image_urls(raw: &str) -> Vec<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Vec::new();
    }
    if value.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(value) {
            return items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
    value
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A validated import row, ready to insert or merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportVehicle {
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub price: i64,
    pub trim: Option<String>,
    pub mileage: Option<i64>,
    pub stock_number: Option<String>,
    pub condition: Option<Condition>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub fuel_type: Option<String>,
    pub body_style: Option<String>,
    pub engine: Option<String>,
    pub carfax_url: Option<String>,
    pub window_sticker_url: Option<String>,
    pub is_featured_homepage: Option<bool>,
    pub featured_rank: Option<i32>,
    pub call_for_availability_enabled: Option<bool>,
    pub is_active: Option<bool>,
    /// Image URLs, primary first, de-duplicated. Empty means "leave as is".
    pub image_urls: Vec<String>,
}

impl ImportVehicle {
    /// `"<year> <make> <model>"`.
    pub fn summary(&self) -> String {
        vehicle_summary(Some(self.year), &self.make, &self.model, None)
    }
}

/// Validate one row. On failure returns every reason found, each prefixed
/// with `Row <line>:`.
pub fn validate_row(row: &CsvRow, max_year: i32) -> Result<ImportVehicle, Vec<String>> {
    let n = row.line;
    let mut errors = Vec::new();
    let text = |col: &str| row.get(col).map(str::to_string);

    let vin = match validate_vin(row.get("vin").unwrap_or_default()) {
        Ok(vin) => Some(vin),
        Err(reason) => {
            errors.push(format!("Row {n}: {reason}"));
            None
        }
    };

    for field in REQUIRED_COLUMNS.iter().filter(|f| **f != "vin") {
        if row.get(field).is_none() {
            errors.push(format!("Row {n}: Missing required field '{field}'"));
        }
    }

    let year = row.get("year").and_then(|raw| {
        match normalize_number(raw).and_then(|y| i32::try_from(y).ok()) {
            Some(y) if (EARLIEST_MODEL_YEAR..=max_year).contains(&y) => Some(y),
            _ => {
                errors.push(format!("Row {n}: Invalid year '{raw}'"));
                None
            }
        }
    });

    let mut non_negative = |col: &str, label: &str| -> Option<i64> {
        let raw = row.get(col)?;
        match normalize_number(raw) {
            Some(v) if v < 0 => {
                errors.push(format!("Row {n}: {label} cannot be negative"));
                None
            }
            Some(v) => Some(v),
            None => {
                errors.push(format!("Row {n}: Invalid {col} '{raw}'"));
                None
            }
        }
    };
    let price = non_negative("price", "Price");
    let mileage = non_negative("mileage", "Mileage");

    let featured_rank = match row.get("featured_rank") {
        None => None,
        Some(raw) => match normalize_number(raw).and_then(|r| i32::try_from(r).ok()) {
            Some(r) => Some(r),
            None => {
                errors.push(format!("Row {n}: Invalid featured_rank '{raw}'"));
                None
            }
        },
    };

    let (Some(vin), Some(year), Some(make), Some(model), Some(price), true) = (
        vin,
        year,
        text("make"),
        text("model"),
        price,
        errors.is_empty(),
    ) else {
        return Err(errors);
    };

    let mut image_urls: Vec<String> = Vec::new();
    let primary = text("primary_image_url");
    for url in primary
        .into_iter()
        .chain(parse_image_urls(row.get("image_urls").unwrap_or_default()))
    {
        if !image_urls.contains(&url) {
            image_urls.push(url);
        }
    }

    let flag = |col: &str| row.get(col).and_then(normalize_boolean);

    Ok(ImportVehicle {
        vin,
        year,
        make,
        model,
        price,
        trim: text("trim"),
        mileage,
        stock_number: text("stock_number"),
        condition: row.get("condition").map(Condition::parse_lenient),
        exterior_color: text("exterior_color"),
        interior_color: text("interior_color"),
        transmission: text("transmission"),
        drivetrain: text("drivetrain"),
        fuel_type: text("fuel_type"),
        body_style: text("body_style"),
        engine: text("engine"),
        carfax_url: text("carfax_url"),
        window_sticker_url: text("window_sticker_url"),
        is_featured_homepage: flag("is_featured_homepage"),
        featured_rank,
        call_for_availability_enabled: flag("call_for_availability_enabled"),
        is_active: flag("is_active"),
        image_urls,
    })
}

// ── Planning ─────────────────────────────────────────────────────────

/// What a valid row will do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportAction {
    Create,
    Update,
}

/// A valid row and its planned action.
#[derive(Debug, Clone)]
pub struct PlannedRow {
    pub row: usize,
    pub action: ImportAction,
    pub data: ImportVehicle,
}

/// A row that will not be imported, with every reason found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,
    pub vin: String,
    pub reasons: Vec<String>,
}

/// Summary line shown in the preview table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub row: usize,
    pub vin: String,
    pub vehicle: String,
    pub action: ImportAction,
    pub price: i64,
}

impl From<&PlannedRow> for PreviewRow {
    fn from(p: &PlannedRow) -> Self {
        Self {
            row: p.row,
            vin: p.data.vin.clone(),
            vehicle: p.data.summary(),
            action: p.action,
            price: p.data.price,
        }
    }
}

/// Every data row of a file sorted into exactly one partition.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub headers: Vec<String>,
    pub to_create: Vec<PlannedRow>,
    pub to_update: Vec<PlannedRow>,
    pub skipped: Vec<SkippedRow>,
}

impl ImportPlan {
    pub fn total_rows(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.skipped.len()
    }

    fn push(&mut self, planned: PlannedRow) {
        match planned.action {
            ImportAction::Create => self.to_create.push(planned),
            ImportAction::Update => self.to_update.push(planned),
        }
    }

    /// Valid rows in source order.
    pub fn rows_to_apply(&self) -> Vec<&PlannedRow> {
        let mut rows: Vec<&PlannedRow> =
            self.to_create.iter().chain(self.to_update.iter()).collect();
        rows.sort_by_key(|r| r.row);
        rows
    }

    /// Preview report for this plan. Nothing is applied yet.
    pub fn report(&self, dry_run: bool) -> CsvImportReport {
        let preview: Vec<PreviewRow> = self
            .rows_to_apply()
            .into_iter()
            .take(MAX_PREVIEW_ROWS)
            .map(PreviewRow::from)
            .collect();

        let errors = self
            .skipped
            .iter()
            .flat_map(|s| s.reasons.iter().cloned())
            .collect();

        CsvImportReport {
            success: true,
            dry_run,
            counts: ImportCounts {
                total_rows: self.total_rows(),
                valid_rows: self.to_create.len() + self.to_update.len(),
                to_create: self.to_create.len(),
                to_update: self.to_update.len(),
                skipped: self.skipped.len(),
                created: 0,
                updated: 0,
            },
            headers: self.headers.clone(),
            preview,
            to_create: self.to_create.iter().map(PreviewRow::from).collect(),
            to_update: self.to_update.iter().map(PreviewRow::from).collect(),
            skipped: self.skipped.clone(),
            errors,
        }
    }
}

/// Partition parsed rows against the set of VINs already in inventory.
///
/// `existing_vins` must be upper-case. A VIN repeated later in the same
/// file is skipped, citing the row where it first appeared.
pub fn build_plan(parsed: &ParsedCsv, existing_vins: &HashSet<String>) -> ImportPlan {
    let max_year = chrono::Utc::now().year() + 2;
    build_plan_with_max_year(parsed, existing_vins, max_year)
}

fn build_plan_with_max_year(
    parsed: &ParsedCsv,
    existing_vins: &HashSet<String>,
    max_year: i32,
) -> ImportPlan {
    let mut plan = ImportPlan {
        headers: parsed.headers.clone(),
        ..Default::default()
    };
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (line, message) in &parsed.malformed {
        plan.skipped.push(SkippedRow {
            row: *line,
            vin: "N/A".to_string(),
            reasons: vec![format!("Row {line}: {message}")],
        });
    }

    for row in &parsed.rows {
        let raw_vin = row.get("vin").map(str::to_uppercase);
        let duplicate_of = raw_vin.as_ref().and_then(|vin| match first_seen.get(vin) {
            Some(&first) => Some(first),
            None => {
                first_seen.insert(vin.clone(), row.line);
                None
            }
        });

        let mut result = validate_row(row, max_year);
        if let Some(first) = duplicate_of {
            let reason = format!(
                "Row {}: Duplicate VIN in file (first seen on row {first})",
                row.line
            );
            match &mut result {
                Err(reasons) => reasons.push(reason),
                Ok(_) => result = Err(vec![reason]),
            }
        }

        match result {
            Ok(data) => {
                let action = if existing_vins.contains(&data.vin) {
                    ImportAction::Update
                } else {
                    ImportAction::Create
                };
                plan.push(PlannedRow {
                    row: row.line,
                    action,
                    data,
                });
            }
            Err(reasons) => plan.skipped.push(SkippedRow {
                row: row.line,
                vin: raw_vin.unwrap_or_else(|| "N/A".to_string()),
                reasons,
            }),
        }
    }

    plan.skipped.sort_by_key(|s| s.row);
    plan
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub to_create: usize,
    pub to_update: usize,
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
}

/// Response body of the import endpoint, for both dry runs and commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportReport {
    pub success: bool,
    pub dry_run: bool,
    pub counts: ImportCounts,
    pub headers: Vec<String>,
    /// First rows of `to_create` and `to_update` in source order.
    pub preview: Vec<PreviewRow>,
    pub to_create: Vec<PreviewRow>,
    pub to_update: Vec<PreviewRow>,
    pub skipped: Vec<SkippedRow>,
    pub errors: Vec<String>,
}

impl CsvImportReport {
    pub fn record_created(&mut self) {
        self.counts.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.counts.updated += 1;
    }

    /// A valid row that failed to apply.
    pub fn record_failure(&mut self, vin: &str, message: impl std::fmt::Display) {
        self.errors
            .push(format!("Database error for VIN {vin}: {message}"));
        self.counts.skipped += 1;
    }

    /// Close out a commit: succeeded if anything was written or nothing failed.
    pub fn finish(&mut self) {
        self.success =
            self.errors.is_empty() || self.counts.created + self.counts.updated > 0;
    }
}

/// Header row plus one sample row.
pub fn generate_csv_template() -> Result<Vec<u8>, CsvImportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TEMPLATE_HEADERS)?;
    writer.write_record(TEMPLATE_SAMPLE_ROW)?;
    writer
        .into_inner()
        .map_err(|e| CsvImportError::Csv(e.into_error().into()))
}
