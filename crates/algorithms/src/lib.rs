//! # ChangeLens Algorithms
//!
//! Raster analysis stages of the ChangeLens change/risk pipeline.
//!
//! ## Stages
//!
//! - **masking**: scene-classification quality masking
//! - **composite**: per-pixel median compositing over an epoch
//! - **matching**: region-windowed linear histogram matching
//! - **sharpen**: band mean + mean-injection pansharpening
//! - **align**: nearest/bilinear resampling onto a target scale
//! - **indices**: normalized-difference spectral indices
//! - **area**: thresholded km² area aggregation over a region
//! - **risk**: elevation-band risk classification
//! - **change**: the end-to-end bi-temporal analyzer

mod maybe_rayon;

pub mod align;
pub mod area;
pub mod change;
pub mod composite;
pub mod config;
pub mod indices;
pub mod masking;
pub mod matching;
pub mod risk;
pub mod sharpen;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::align::{align_image, resample_to_scale, Resampling};
    pub use crate::area::{significant_area_for_band, significant_area_km2, AreaMeasurement};
    pub use crate::change::{analyze, grid_difference, ChangeAssessment, IndexChange};
    pub use crate::composite::median_composite;
    pub use crate::config::{AnalysisConfig, DateRange, IndexThresholds};
    pub use crate::indices::{normalized_difference, spectral_index, IndexKind};
    pub use crate::masking::{apply_scene_mask, SceneMaskParams};
    pub use crate::matching::{histogram_match, matched_band_name, region_min_max, BandStats};
    pub use crate::risk::{classify_elevation, RiskClass, RiskCutPoints, RISK_NODATA};
    pub use crate::sharpen::{band_mean, mean_injection};
    pub use changelens_core::prelude::*;
}
