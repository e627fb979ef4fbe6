//! Normalized-difference spectral indices.
//!
//! All three pipeline indices are normalized differences over a band pair;
//! the engine is parametrized by the pair, not by index-specific code paths.

use crate::maybe_rayon::*;
use changelens_core::raster::{Grid, Image};
use changelens_core::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// The spectral indices computed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// NDVI: (NIR - Red) / (NIR + Red)
    Vegetation,
    /// NDWI (McFeeters): (Green - NIR) / (Green + NIR)
    Water,
    /// NDBI: (SWIR - NIR) / (SWIR + NIR)
    BuiltUp,
}

impl IndexKind {
    /// All index kinds in reporting order.
    pub const ALL: [IndexKind; 3] = [Self::Vegetation, Self::Water, Self::BuiltUp];

    /// The (A, B) band pair of the normalized difference.
    pub fn band_pair(&self) -> (&'static str, &'static str) {
        match self {
            Self::Vegetation => ("nir", "red"),
            Self::Water => ("green", "nir"),
            Self::BuiltUp => ("swir", "nir"),
        }
    }

    /// Output band name for this index.
    pub fn band_name(&self) -> &'static str {
        match self {
            Self::Vegetation => "ndvi",
            Self::Water => "ndwi",
            Self::BuiltUp => "ndbi",
        }
    }
}

/// Compute the normalized difference between two bands:
///
/// `(a - b) / (a + b)`
///
/// Bounded in [-1, 1] where defined. Pixels where `a + b == 0` have no
/// defined value and are masked invalid rather than propagated as NaN
/// arithmetic or infinity; invalid input pixels stay invalid.
pub fn normalized_difference(a: &Grid<f64>, b: &Grid<f64>) -> Result<Grid<f64>> {
    if !a.same_grid_as(b) {
        return Err(Error::GridMismatch {
            left: "band a".to_string(),
            right: "band b".to_string(),
            detail: "normalized difference needs identical grids".to_string(),
        });
    }

    let (rows, cols) = a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };

                if a.is_nodata(va) || b.is_nodata(vb) {
                    continue;
                }

                let sum = va + vb;
                if sum.abs() < 1e-10 {
                    continue; // undefined, masked
                }

                row_data[col] = (va - vb) / sum;
            }
            row_data
        })
        .collect();

    let mut output = a.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Compute a spectral index from an image's named bands.
///
/// Fails with `MissingBand` when either band of the pair is absent.
pub fn spectral_index(image: &Image, kind: IndexKind) -> Result<Grid<f64>> {
    let (a, b) = kind.band_pair();
    let band_a = image.try_band(a, "index computation")?;
    let band_b = image.try_band(b, "index computation")?;
    normalized_difference(band_a, band_b)
}
