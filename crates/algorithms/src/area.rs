//! Area aggregation.
//!
//! Integrates the ground area of index pixels above a significance
//! threshold over a Region, yielding a km² scalar. Robust to missing data:
//! a region with zero significant pixels aggregates to 0.0 ("no significant
//! area"), never to an error. A pixel budget caps compute cost.

use changelens_core::raster::{Grid, Image};
use changelens_core::{Error, Region, Result};

use crate::matching::{check_region_crs, region_pixel_window};

/// A km² measurement together with the inputs it was computed against.
///
/// Never persisted; recomputed on each call.
#[derive(Debug, Clone)]
pub struct AreaMeasurement {
    /// Integrated ground area in km².
    pub km2: f64,
    /// The significance threshold applied.
    pub threshold: f64,
    /// The region aggregated over.
    pub region: Region,
}

/// Sum the ground area of valid pixels strictly above `threshold` whose
/// centers fall inside `region`.
///
/// Masked pixels never count, whatever their underlying value. Fails with
/// `ResolutionBudgetExceeded` when the region's pixel window at this grid's
/// scale exceeds `max_pixels` — the caller must coarsen the scale or shrink
/// the region rather than have the sum silently truncated.
pub fn significant_area_km2(
    index: &Grid<f64>,
    region: &Region,
    threshold: f64,
    max_pixels: u64,
) -> Result<AreaMeasurement> {
    check_region_crs(index, region)?;

    let (row_range, col_range) = region_pixel_window(index, region);
    let window_pixels = (row_range.len() as u64).saturating_mul(col_range.len() as u64);
    if window_pixels > max_pixels {
        return Err(Error::ResolutionBudgetExceeded {
            required: window_pixels,
            budget: max_pixels,
        });
    }

    let mut km2 = 0.0;
    for row in row_range {
        let pixel_area = index.pixel_area_km2(row);
        for col in col_range.clone() {
            let (x, y) = index.pixel_to_geo(col, row);
            if !region.contains(x, y) {
                continue;
            }
            let v = unsafe { index.get_unchecked(row, col) };
            if index.is_nodata(v) {
                continue;
            }
            if v > threshold {
                km2 += pixel_area;
            }
        }
    }

    Ok(AreaMeasurement {
        km2,
        threshold,
        region: region.clone(),
    })
}

/// Aggregate a named band of an image, treating an absent band as zero
/// significant area.
///
/// This is the one documented `MissingBand` recovery in the pipeline: an
/// aggregation result can legitimately lack the band when the region holds
/// no valid pixels above threshold.
pub fn significant_area_for_band(
    image: &Image,
    band: &str,
    region: &Region,
    threshold: f64,
    max_pixels: u64,
) -> Result<AreaMeasurement> {
    match image.band(band) {
        Some(grid) => significant_area_km2(grid, region, threshold, max_pixels),
        None => Ok(AreaMeasurement {
            km2: 0.0,
            threshold,
            region: region.clone(),
        }),
    }
}
