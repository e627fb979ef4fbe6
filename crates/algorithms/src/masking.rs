//! Quality masking from a scene-classification band.
//!
//! A categorical classification band (e.g. Sentinel-2 SCL) tags each pixel
//! with a surface/quality class. Pixels whose class is in the configured
//! invalid set — clouds, shadows, cirrus, snow/ice, saturated — are
//! invalidated across every band of the image.

use crate::maybe_rayon::*;
use changelens_core::raster::{Grid, Image};
use changelens_core::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Parameters for scene-classification masking.
///
/// The invalid code set is configurable; the defaults follow the Sentinel-2
/// scene classification layer but nothing here is sensor-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMaskParams {
    /// Name of the categorical classification band.
    pub classification_band: String,
    /// Category codes treated as invalid.
    pub invalid_codes: Vec<u8>,
}

impl Default for SceneMaskParams {
    fn default() -> Self {
        Self {
            classification_band: "scl".to_string(),
            // saturated/defective, cloud shadow, cloud medium/high, cirrus, snow/ice
            invalid_codes: vec![1, 3, 8, 9, 10, 11],
        }
    }
}

/// Invalidate every band of `image` wherever the classification band carries
/// an invalid category code.
///
/// Pure transform: returns a new image, the input is untouched. Pixels whose
/// classification value is itself invalid are also masked out. Fails with
/// `MissingBand` when the classification band is absent.
pub fn apply_scene_mask(image: &Image, params: &SceneMaskParams) -> Result<Image> {
    let scl = image.try_band(&params.classification_band, "quality masking")?;
    let (rows, cols) = scl.shape();

    // Per-pixel validity from the classification band
    let valid: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_valid = vec![false; cols];
            for col in 0..cols {
                let code = unsafe { scl.get_unchecked(row, col) };
                if code.is_nan() {
                    continue;
                }
                let code = code.round() as i64;
                let invalid = params
                    .invalid_codes
                    .iter()
                    .any(|&c| i64::from(c) == code);
                row_valid[col] = !invalid;
            }
            row_valid
        })
        .collect();

    let mut out = Image::new();
    for (name, band) in image.iter() {
        let masked = mask_band(band, &valid, rows, cols)?;
        out.push_band(name, masked)?;
    }

    Ok(out)
}

fn mask_band(band: &Grid<f64>, valid: &[bool], rows: usize, cols: usize) -> Result<Grid<f64>> {
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                if !valid[row * cols + col] {
                    continue;
                }
                let v = unsafe { band.get_unchecked(row, col) };
                if band.is_nodata(v) {
                    continue;
                }
                row_data[col] = v;
            }
            row_data
        })
        .collect();

    let mut output = band.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
