//! Analysis configuration.
//!
//! All tunables of a pipeline run live in one explicit struct passed to the
//! analyzer and driver — no process-wide state — so runs stay independent
//! and testable in parallel.

use serde::{Deserialize, Serialize};

use crate::indices::IndexKind;
use crate::masking::SceneMaskParams;
use crate::risk::RiskCutPoints;

/// An inclusive ISO-8601 date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Interval form used by catalog queries, e.g. `2024-01-01/2024-02-01`.
    pub fn as_interval(&self) -> String {
        format!("{}/{}", self.start, self.end)
    }
}

/// Per-index significance thresholds: an index pixel strictly above its
/// threshold counts toward the significant area.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexThresholds {
    pub vegetation: f64,
    pub water: f64,
    pub built_up: f64,
}

impl IndexThresholds {
    pub fn for_kind(&self, kind: IndexKind) -> f64 {
        match kind {
            IndexKind::Vegetation => self.vegetation,
            IndexKind::Water => self.water,
            IndexKind::BuiltUp => self.built_up,
        }
    }
}

impl Default for IndexThresholds {
    fn default() -> Self {
        Self {
            vegetation: 0.4,
            water: 0.2,
            built_up: 0.0,
        }
    }
}

/// Full configuration of a change/risk analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Pre-event observation window.
    pub pre_event: DateRange,
    /// Post-event observation window.
    pub post_event: DateRange,
    /// Scenes with a larger cloudy fraction are filtered out at the catalog.
    pub max_cloud_fraction: f64,
    /// Scene-classification masking parameters.
    pub scene_mask: SceneMaskParams,
    /// Per-index significance thresholds.
    pub thresholds: IndexThresholds,
    /// Elevation risk cut points.
    pub risk_cuts: RiskCutPoints,
    /// Name of the higher-resolution band used for sharpening.
    pub pan_band: String,
    /// Bands sharpened by mean injection.
    pub sharpen_bands: Vec<String>,
    /// Ground sample distance for exported artifacts (CRS units).
    pub export_scale: f64,
    /// Ground sample distance at which the elevation raster is fetched;
    /// independent of the export scale.
    pub elevation_scale: f64,
    /// Maximum pixels an aggregation may touch.
    pub max_pixels: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pre_event: DateRange::new("2023-01-01", "2023-02-01"),
            post_event: DateRange::new("2023-03-01", "2023-04-01"),
            max_cloud_fraction: 0.2,
            scene_mask: SceneMaskParams::default(),
            thresholds: IndexThresholds::default(),
            risk_cuts: RiskCutPoints::default(),
            pan_band: "pan".to_string(),
            sharpen_bands: vec![
                "red".to_string(),
                "green".to_string(),
                "blue".to_string(),
            ],
            export_scale: 10.0,
            elevation_scale: 30.0,
            max_pixels: 100_000_000,
        }
    }
}
