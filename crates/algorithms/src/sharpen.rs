//! Mean-injection pansharpening.
//!
//! Fuses a higher-resolution single band into coarser multi-band imagery by
//! adding, per pixel, the difference between the reference band and the mean
//! of the bands being sharpened:
//!
//! `sharpened = band + (reference - mean(bands))`
//!
//! The method assumes the reference's spatial detail is not already present
//! in the coarse mean, needs no per-band weighting, and is order-independent
//! across bands.

use crate::maybe_rayon::*;
use changelens_core::raster::{Grid, Image};
use changelens_core::{Error, Result};
use ndarray::Array2;

/// Per-pixel mean across all bands of an image.
///
/// A pixel invalid in any band is invalid in the mean: the mean would be
/// biased otherwise, and the sharpened output must not resurrect masked
/// pixels.
pub fn band_mean(image: &Image) -> Result<Grid<f64>> {
    let template = image.template().ok_or(Error::InvalidParameter {
        name: "image",
        value: "empty".to_string(),
        reason: "band mean needs at least one band".to_string(),
    })?;

    let (rows, cols) = template.shape();
    let bands: Vec<&Grid<f64>> = image.iter().map(|(_, g)| g).collect();
    let n = bands.len() as f64;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            'pixel: for col in 0..cols {
                let mut sum = 0.0;
                for band in &bands {
                    let v = unsafe { band.get_unchecked(row, col) };
                    if band.is_nodata(v) {
                        continue 'pixel;
                    }
                    sum += v;
                }
                row_data[col] = sum / n;
            }
            row_data
        })
        .collect();

    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Sharpen every band of `image` against `reference`.
///
/// Preconditions: the reference and every band share an identical grid
/// (align first, otherwise this fails with `GridMismatch`). Output band
/// names and count equal the input's.
pub fn mean_injection(image: &Image, reference: &Grid<f64>) -> Result<Image> {
    let template = image.template().ok_or(Error::InvalidParameter {
        name: "image",
        value: "empty".to_string(),
        reason: "nothing to sharpen".to_string(),
    })?;

    if !template.same_grid_as(reference) {
        return Err(Error::GridMismatch {
            left: "multiband image".to_string(),
            right: "reference band".to_string(),
            detail: "sharpening requires identical grids; resample first".to_string(),
        });
    }

    let mean = band_mean(image)?;
    let (rows, cols) = template.shape();

    let mut out = Image::new();
    for (name, band) in image.iter() {
        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![f64::NAN; cols];
                for col in 0..cols {
                    let v = unsafe { band.get_unchecked(row, col) };
                    let r = unsafe { reference.get_unchecked(row, col) };
                    let m = unsafe { mean.get_unchecked(row, col) };

                    if band.is_nodata(v) || reference.is_nodata(r) || m.is_nan() {
                        continue;
                    }
                    row_data[col] = v + (r - m);
                }
                row_data
            })
            .collect();

        let mut sharpened = band.with_same_meta::<f64>(rows, cols);
        sharpened.set_nodata(Some(f64::NAN));
        *sharpened.data_mut() =
            Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
        out.push_band(name, sharpened)?;
    }

    Ok(out)
}
