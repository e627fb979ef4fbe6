//! Elevation-band risk classification.
//!
//! Classifies an elevation raster into a coarse ordinal flood-susceptibility
//! proxy via two cut points. Low ground floods first, so lower elevation
//! means higher risk.

use crate::maybe_rayon::*;
use changelens_core::raster::Grid;
use changelens_core::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Nodata code of the risk raster (0 = unclassified/invalid).
pub const RISK_NODATA: u8 = 0;

/// Ordinal risk class derived from elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskClass {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl RiskClass {
    /// Pixel encoding, uniform for thresholding and colorizing.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Classify one elevation sample.
    ///
    /// Cut points are exclusive on the low side: elevation exactly at
    /// `low_above` is Medium, exactly at `high_at_or_below` is High.
    pub fn from_elevation(elevation: f64, cuts: &RiskCutPoints) -> Self {
        if elevation > cuts.low_above {
            Self::Low
        } else if elevation > cuts.high_at_or_below {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Elevation cut points in metres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskCutPoints {
    /// Elevations strictly above this are Low risk.
    pub low_above: f64,
    /// Elevations at or below this are High risk.
    pub high_at_or_below: f64,
}

impl Default for RiskCutPoints {
    fn default() -> Self {
        Self {
            low_above: 50.0,
            high_at_or_below: 10.0,
        }
    }
}

/// Classify an elevation grid into per-pixel risk codes.
///
/// Invalid elevation pixels map to [`RISK_NODATA`].
pub fn classify_elevation(elevation: &Grid<f64>, cuts: &RiskCutPoints) -> Result<Grid<u8>> {
    if cuts.low_above <= cuts.high_at_or_below {
        return Err(Error::InvalidParameter {
            name: "cut_points",
            value: format!("{} <= {}", cuts.low_above, cuts.high_at_or_below),
            reason: "the Low cut must sit above the High cut".to_string(),
        });
    }

    let (rows, cols) = elevation.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![RISK_NODATA; cols];
            for col in 0..cols {
                let elev = unsafe { elevation.get_unchecked(row, col) };
                if elevation.is_nodata(elev) {
                    continue;
                }
                row_data[col] = RiskClass::from_elevation(elev, cuts).code();
            }
            row_data
        })
        .collect();

    let mut output = elevation.with_same_meta::<u8>(rows, cols);
    output.set_nodata(Some(RISK_NODATA));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
