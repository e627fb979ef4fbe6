//! Presentation styles for assessment layers.
//!
//! Each analysis output gets a [`LayerStyle`]: which bands to draw, the
//! value stretch, and a hex palette. Styles are plain data handed to
//! whatever map front end renders the run; no drawing happens here.

use changelens_algorithms::change::ChangeAssessment;
use changelens_algorithms::matching::matched_band_name;
use serde::{Deserialize, Serialize};

/// How one layer should be rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStyle {
    pub name: String,
    /// Bands to draw: three for an RGB layer, one for a palette layer.
    pub bands: Vec<String>,
    /// Stretch minimum.
    pub min: f64,
    /// Stretch maximum.
    pub max: f64,
    /// Hex color ramp; empty for RGB layers.
    pub palette: Vec<String>,
}

impl LayerStyle {
    fn rgb(name: &str, bands: [&str; 3], min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            bands: bands.iter().map(|b| b.to_string()).collect(),
            min,
            max,
            palette: Vec::new(),
        }
    }

    fn palette(name: &str, band: &str, min: f64, max: f64, colors: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            bands: vec![band.to_string()],
            min,
            max,
            palette: colors.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Diverging ramp for signed index differences: loss red, gain blue.
const DIVERGING: &[&str] = &["#b2182b", "#f7f7f7", "#2166ac"];

/// Newly-wet highlight.
const WATER_GAIN: &[&str] = &["#c6dbef", "#2171b5", "#08306b"];

/// Terrain ramp for elevation.
const TERRAIN: &[&str] = &["#00441b", "#f7fcb9", "#8c510a", "#ffffff"];

/// Ordinal risk classes: green, amber, red.
const RISK: &[&str] = &["#1a9850", "#fee08b", "#d73027"];

/// Build the default layer set for one assessment.
pub fn assessment_layers(assessment: &ChangeAssessment, pan_band: &str) -> Vec<LayerStyle> {
    let mut layers = vec![
        LayerStyle::rgb("true-color", ["red", "green", "blue"], 0.0, 0.3),
        LayerStyle::palette(
            "sharpened-detail",
            &matched_band_name(pan_band),
            0.0,
            0.3,
            &["#000000", "#ffffff"],
        ),
    ];

    for change in &assessment.indices {
        layers.push(LayerStyle::palette(
            &format!("{}-change", change.kind.band_name()),
            change.kind.band_name(),
            -1.0,
            1.0,
            DIVERGING,
        ));
    }

    layers.push(LayerStyle::palette("new-water", "new_water", 0.0, 1.0, WATER_GAIN));
    layers.push(LayerStyle::palette("elevation", "elevation", 0.0, 500.0, TERRAIN));
    layers.push(LayerStyle::palette("risk", "risk", 1.0, 3.0, RISK));

    layers
}
