//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?limit=` for the featured inventory strip. Clamped in the repository
/// layer via `clamp_featured_limit`.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// `?dry_run=` for the CSV importer. Defaults to a preview.
#[derive(Debug, Deserialize)]
pub struct DryRunParams {
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}
