//! Grid alignment: resampling to a common scale.
//!
//! Bands at different native resolutions must share one grid before any
//! pixel-wise arithmetic (sharpening, indices) is valid. This module
//! resamples a grid to a target ground sample distance under the grid's own
//! CRS. Output grids are axis-aligned and uniform, and masked pixels stay
//! masked: nearest-neighbor carries the mask, bilinear conservatively
//! invalidates a pixel when any meaningfully-weighted contributor is
//! invalid.

use changelens_core::raster::{Grid, Image};
use changelens_core::{Error, Result};
use ndarray::Array2;

/// Resampling method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resampling {
    /// Take the value of the source cell containing the output pixel center.
    Nearest,
    /// Distance-weighted average of the four surrounding source cells.
    Bilinear,
}

/// Resample a grid to the given ground sample distance.
///
/// Aligning an already-aligned grid to its own scale returns an equivalent
/// grid (idempotence). The target scale is expressed in the grid's CRS
/// units; reprojection to a different CRS is not performed here.
pub fn resample_to_scale(
    grid: &Grid<f64>,
    target_scale: f64,
    method: Resampling,
) -> Result<Grid<f64>> {
    if !(target_scale > 0.0) || !target_scale.is_finite() {
        return Err(Error::InvalidParameter {
            name: "target_scale",
            value: target_scale.to_string(),
            reason: "scale must be a positive finite ground sample distance".to_string(),
        });
    }

    let (min_x, min_y, max_x, max_y) = grid.bounds();
    let out_cols = cells_for_extent(max_x - min_x, target_scale);
    let out_rows = cells_for_extent(max_y - min_y, target_scale);

    let mut transform = *grid.transform();
    transform.origin_x = min_x;
    transform.origin_y = max_y;
    transform.pixel_width = target_scale;
    transform.pixel_height = -target_scale;

    let data: Vec<f64> = (0..out_rows * out_cols)
        .map(|i| {
            let row = i / out_cols;
            let col = i % out_cols;
            let x = transform.origin_x + (col as f64 + 0.5) * transform.pixel_width;
            let y = transform.origin_y + (row as f64 + 0.5) * transform.pixel_height;
            match method {
                Resampling::Nearest => sample_nearest(grid, x, y),
                Resampling::Bilinear => sample_bilinear(grid, x, y),
            }
        })
        .collect();

    let mut output = grid.with_same_meta::<f64>(out_rows, out_cols);
    output.set_transform(transform);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((out_rows, out_cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Resample every band of an image to a common scale.
pub fn align_image(image: &Image, target_scale: f64, method: Resampling) -> Result<Image> {
    let mut out = Image::new();
    for (name, band) in image.iter() {
        out.push_band(name, resample_to_scale(band, target_scale, method)?)?;
    }
    Ok(out)
}

/// Number of output cells needed to cover `extent` at `scale`.
///
/// Snaps to the exact count when the division is within float noise of an
/// integer, so re-aligning at the native scale reproduces the input
/// dimensions.
fn cells_for_extent(extent: f64, scale: f64) -> usize {
    let n = extent / scale;
    let cells = if (n - n.round()).abs() < 1e-9 {
        n.round()
    } else {
        n.ceil()
    };
    (cells as usize).max(1)
}

fn sample_nearest(grid: &Grid<f64>, x: f64, y: f64) -> f64 {
    let (col_f, row_f) = grid.geo_to_pixel(x, y);
    let (rows, cols) = grid.shape();

    if col_f < 0.0 || row_f < 0.0 {
        return f64::NAN;
    }
    let col = col_f.floor() as usize;
    let row = row_f.floor() as usize;
    if row >= rows || col >= cols {
        return f64::NAN;
    }

    let v = unsafe { grid.get_unchecked(row, col) };
    if grid.is_nodata(v) {
        f64::NAN
    } else {
        v
    }
}

fn sample_bilinear(grid: &Grid<f64>, x: f64, y: f64) -> f64 {
    let (col_f, row_f) = grid.geo_to_pixel(x, y);
    let (rows, cols) = grid.shape();

    // Anchor to source pixel centers
    let u = col_f - 0.5;
    let v = row_f - 0.5;
    let c0 = u.floor();
    let r0 = v.floor();
    let fx = u - c0;
    let fy = v - r0;

    let corners = [
        (r0, c0, (1.0 - fx) * (1.0 - fy)),
        (r0, c0 + 1.0, fx * (1.0 - fy)),
        (r0 + 1.0, c0, (1.0 - fx) * fy),
        (r0 + 1.0, c0 + 1.0, fx * fy),
    ];

    let mut acc = 0.0;
    for (r, c, w) in corners {
        // Zero-weight corners don't contribute and must not veto validity,
        // otherwise re-aligning a grid at its own scale would erode the mask.
        if w < 1e-12 {
            continue;
        }
        if r < 0.0 || c < 0.0 || r as usize >= rows || c as usize >= cols {
            return f64::NAN;
        }
        let val = unsafe { grid.get_unchecked(r as usize, c as usize) };
        if grid.is_nodata(val) {
            return f64::NAN;
        }
        acc += w * val;
    }

    acc
}
