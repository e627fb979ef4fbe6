//! Radiometric matching between epochs.
//!
//! Matches one band's value range onto another's by linear min/max rescale
//! over a Region. Used before fusion so the injected high-resolution detail
//! is radiometrically consistent with the bands it sharpens.

use crate::maybe_rayon::*;
use changelens_core::raster::Grid;
use changelens_core::{Error, Region, Result};
use ndarray::Array2;

/// Min/max statistics of one band's valid pixels within a Region.
///
/// Computed on demand and never cached: masking state may differ between
/// calls for the same band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStats {
    pub min: f64,
    pub max: f64,
}

impl BandStats {
    /// Whether the range is too narrow to normalize against.
    pub fn is_degenerate(&self) -> bool {
        (self.max - self.min).abs() < f64::EPSILON
    }
}

/// Suffix convention for matched bands, so a matched band can live next to
/// its raw counterpart without a name collision.
pub fn matched_band_name(band: &str) -> String {
    format!("{band}_matched")
}

/// Compute min/max over the valid pixels of `grid` whose centers fall
/// inside `region`.
///
/// Fails with `NoValidData` when the region holds zero valid pixels for
/// this band; with `GridMismatch` when grid and region CRS differ.
pub fn region_min_max(grid: &Grid<f64>, region: &Region, band: &str) -> Result<BandStats> {
    check_region_crs(grid, region)?;

    let (rows, cols) = grid.shape();
    let (row_range, col_range) = region_pixel_window(grid, region);

    let mut min = f64::MAX;
    let mut max = f64::MIN;
    let mut count = 0usize;

    for row in row_range.clone() {
        for col in col_range.clone() {
            if row >= rows || col >= cols {
                continue;
            }
            let (x, y) = grid.pixel_to_geo(col, row);
            if !region.contains(x, y) {
                continue;
            }
            let v = unsafe { grid.get_unchecked(row, col) };
            if grid.is_nodata(v) {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
            count += 1;
        }
    }

    if count == 0 {
        return Err(Error::NoValidData {
            band: band.to_string(),
        });
    }

    Ok(BandStats { min, max })
}

/// Linearly rescale `source` so its [min, max] over `region` maps onto
/// `reference`'s [min, max] over the same region:
///
/// `matched = (v - src_min) / (src_max - src_min) * (ref_max - ref_min) + ref_min`
///
/// A constant source band (src_max == src_min) fails with `DegenerateRange`
/// rather than dividing by zero; a zero-range match would poison every
/// downstream fusion, so callers must treat it as fatal, not skippable.
pub fn histogram_match(
    source: &Grid<f64>,
    reference: &Grid<f64>,
    region: &Region,
    band: &str,
) -> Result<Grid<f64>> {
    let src = region_min_max(source, region, band)?;
    let dst = region_min_max(reference, region, band)?;

    if src.is_degenerate() {
        return Err(Error::DegenerateRange {
            band: band.to_string(),
            value: src.min,
        });
    }

    let scale = (dst.max - dst.min) / (src.max - src.min);
    let (rows, cols) = source.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let v = unsafe { source.get_unchecked(row, col) };
                if source.is_nodata(v) {
                    continue;
                }
                row_data[col] = (v - src.min) * scale + dst.min;
            }
            row_data
        })
        .collect();

    let mut output = source.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Pixel window covered by the region's bounding box, clamped to the grid.
pub(crate) fn region_pixel_window(
    grid: &Grid<f64>,
    region: &Region,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let (min_x, min_y, max_x, max_y) = region.bounding_box();
    let (rows, cols) = grid.shape();

    let (c0, r0) = grid.geo_to_pixel(min_x, max_y);
    let (c1, r1) = grid.geo_to_pixel(max_x, min_y);

    let row_start = r0.min(r1).floor().max(0.0) as usize;
    let row_end = (r0.max(r1).ceil().max(0.0) as usize).min(rows);
    let col_start = c0.min(c1).floor().max(0.0) as usize;
    let col_end = (c0.max(c1).ceil().max(0.0) as usize).min(cols);

    (row_start..row_end, col_start..col_end)
}

pub(crate) fn check_region_crs(grid: &Grid<f64>, region: &Region) -> Result<()> {
    if grid.crs() != region.crs() {
        return Err(Error::GridMismatch {
            left: grid.crs().identifier(),
            right: region.crs().identifier(),
            detail: "grid and region must share a CRS".to_string(),
        });
    }
    Ok(())
}
