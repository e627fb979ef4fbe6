//! Median compositing across an epoch's observations.
//!
//! Collapses a stack of same-grid images into one representative image by
//! taking the per-pixel, per-band median over valid samples. Invalid pixels
//! never contribute; a pixel invalid in every observation stays invalid.

use crate::maybe_rayon::*;
use changelens_core::raster::{Grid, Image};
use changelens_core::{Error, Result};
use ndarray::Array2;

/// Build a median composite from `observations`.
///
/// The band set is taken from the first observation; every other
/// observation must carry the same bands on the same grid.
pub fn median_composite(observations: &[Image]) -> Result<Image> {
    let first = observations.first().ok_or(Error::InvalidParameter {
        name: "observations",
        value: "0".to_string(),
        reason: "a composite needs at least one observation".to_string(),
    })?;

    let template = first.template().ok_or(Error::InvalidParameter {
        name: "observations",
        value: "empty image".to_string(),
        reason: "observations must carry bands".to_string(),
    })?;

    let mut out = Image::new();
    for (name, band) in first.iter() {
        // Gather this band from every observation, checking grid agreement
        let mut stack: Vec<&Grid<f64>> = Vec::with_capacity(observations.len());
        stack.push(band);
        for obs in &observations[1..] {
            let other = obs.try_band(name, "median composite")?;
            if !template.same_grid_as(other) {
                return Err(Error::GridMismatch {
                    left: format!("{name} (first observation)"),
                    right: format!("{name} (later observation)"),
                    detail: "all observations of an epoch must share one grid".to_string(),
                });
            }
            stack.push(other);
        }
        out.push_band(name, median_band(&stack, template)?)?;
    }

    Ok(out)
}

fn median_band(stack: &[&Grid<f64>], template: &Grid<f64>) -> Result<Grid<f64>> {
    let (rows, cols) = template.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut samples = Vec::with_capacity(stack.len());
            for col in 0..cols {
                samples.clear();
                for grid in stack {
                    let v = unsafe { grid.get_unchecked(row, col) };
                    if !grid.is_nodata(v) {
                        samples.push(v);
                    }
                }
                if samples.is_empty() {
                    continue;
                }
                samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let n = samples.len();
                row_data[col] = if n % 2 == 0 {
                    (samples[n / 2 - 1] + samples[n / 2]) / 2.0
                } else {
                    samples[n / 2]
                };
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
