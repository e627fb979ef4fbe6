//! Change & risk analysis.
//!
//! Orchestrates the full pipeline over two epochs: quality masking, median
//! compositing, radiometric matching + pansharpening of the pre-event
//! composite, spectral indices, per-index differencing and area accounting,
//! and elevation risk classification. Stateless: each invocation is a pure
//! pipeline over its inputs, and any stage failure aborts the run — no
//! partial result bundle is ever returned.

use crate::maybe_rayon::*;
use changelens_core::raster::{Grid, Image};
use changelens_core::{Error, Region, Result};
use ndarray::Array2;
use tracing::{debug, info};

use crate::area::significant_area_km2;
use crate::composite::median_composite;
use crate::config::AnalysisConfig;
use crate::indices::{spectral_index, IndexKind};
use crate::masking::apply_scene_mask;
use crate::matching::{histogram_match, matched_band_name};
use crate::risk::classify_elevation;
use crate::sharpen::{band_mean, mean_injection};

/// Change figures for one spectral index.
#[derive(Debug, Clone)]
pub struct IndexChange {
    pub kind: IndexKind,
    /// Significance threshold the areas were computed against.
    pub threshold: f64,
    /// Pre-event index raster.
    pub pre: Grid<f64>,
    /// Post-event index raster.
    pub post: Grid<f64>,
    /// Per-pixel difference (post − pre).
    pub difference: Grid<f64>,
    /// Significant area in the pre-event epoch, km².
    pub pre_area_km2: f64,
    /// Significant area in the post-event epoch, km².
    pub post_area_km2: f64,
    /// post − pre, km².
    pub area_change_km2: f64,
    /// Area change as a percentage of the total region area.
    pub percentage_change: f64,
}

impl IndexChange {
    /// Derive (area change, percentage change) from an area pair and the
    /// total region area. The region area is one computed quantity reused
    /// for every index, not recomputed per call.
    pub fn derive_change(pre_km2: f64, post_km2: f64, region_km2: f64) -> (f64, f64) {
        let area_change = post_km2 - pre_km2;
        let percentage = area_change / region_km2 * 100.0;
        (area_change, percentage)
    }
}

/// Immutable result bundle of one analysis run.
#[derive(Debug, Clone)]
pub struct ChangeAssessment {
    /// Total region area in km², computed once per run.
    pub region_area_km2: f64,
    /// Pre-event median composite (masked).
    pub pre_composite: Image,
    /// Post-event median composite (masked).
    pub post_composite: Image,
    /// Pansharpened pre-event bands plus the matched reference band.
    pub pansharpened: Image,
    /// One entry per index kind, in [`IndexKind::ALL`] order.
    pub indices: Vec<IndexChange>,
    /// Water-index difference restricted to positive change (newly wet).
    pub new_water: Grid<f64>,
    /// The input elevation raster.
    pub elevation: Grid<f64>,
    /// Per-pixel ordinal risk codes.
    pub risk: Grid<u8>,
}

impl ChangeAssessment {
    /// Change figures for one index kind.
    pub fn index_change(&self, kind: IndexKind) -> Option<&IndexChange> {
        self.indices.iter().find(|c| c.kind == kind)
    }
}

/// Run the full change and risk analysis.
///
/// `pre_observations` and `post_observations` are the epoch scene stacks;
/// `elevation` is a static DEM over the same area. All rasters and the
/// region must share one CRS, and scene stacks must be pre-aligned to one
/// grid per epoch (the grid aligner is the primitive for that).
pub fn analyze(
    pre_observations: &[Image],
    post_observations: &[Image],
    elevation: &Grid<f64>,
    region: &Region,
    config: &AnalysisConfig,
) -> Result<ChangeAssessment> {
    let region_area_km2 = region.area_km2();
    info!(region_area_km2, "starting change/risk analysis");

    // Stage 1: quality masking
    let masked_pre = mask_epoch(pre_observations, config)?;
    let masked_post = mask_epoch(post_observations, config)?;

    // Stage 2: median composites
    debug!(
        pre = masked_pre.len(),
        post = masked_post.len(),
        "compositing epochs"
    );
    let pre_composite = median_composite(&masked_pre)?;
    let post_composite = median_composite(&masked_post)?;

    // Stage 3: radiometric match + mean-injection sharpening (pre-event)
    let pansharpened = sharpen_composite(&pre_composite, region, config)?;

    // Stage 4: indices, differences, areas
    let mut indices = Vec::with_capacity(IndexKind::ALL.len());
    for kind in IndexKind::ALL {
        let threshold = config.thresholds.for_kind(kind);
        debug!(index = kind.band_name(), threshold, "computing index change");

        let pre = spectral_index(&pre_composite, kind)?;
        let post = spectral_index(&post_composite, kind)?;
        let difference = grid_difference(&post, &pre)?;

        let pre_area = significant_area_km2(&pre, region, threshold, config.max_pixels)?;
        let post_area = significant_area_km2(&post, region, threshold, config.max_pixels)?;
        let (area_change_km2, percentage_change) =
            IndexChange::derive_change(pre_area.km2, post_area.km2, region_area_km2);

        info!(
            index = kind.band_name(),
            pre_km2 = pre_area.km2,
            post_km2 = post_area.km2,
            area_change_km2,
            "index change computed"
        );

        indices.push(IndexChange {
            kind,
            threshold,
            pre,
            post,
            difference,
            pre_area_km2: pre_area.km2,
            post_area_km2: post_area.km2,
            area_change_km2,
            percentage_change,
        });
    }

    // Stage 5: newly-wet highlight from the water difference
    let water = indices
        .iter()
        .find(|c| c.kind == IndexKind::Water)
        .ok_or_else(|| Error::Other("water index missing from results".to_string()))?;
    let new_water = positive_part(&water.difference)?;

    // Stage 6: elevation risk
    let risk = classify_elevation(elevation, &config.risk_cuts)?;

    info!("analysis complete");
    Ok(ChangeAssessment {
        region_area_km2,
        pre_composite,
        post_composite,
        pansharpened,
        indices,
        new_water,
        elevation: elevation.clone(),
        risk,
    })
}

fn mask_epoch(observations: &[Image], config: &AnalysisConfig) -> Result<Vec<Image>> {
    observations
        .iter()
        .map(|obs| apply_scene_mask(obs, &config.scene_mask))
        .collect()
}

/// Histogram-match the pan band onto the sharpen-band mean, then inject it.
///
/// The matched band joins the output under its `_matched` name, so both the
/// raw and the matched identity stay addressable and nothing is overwritten.
fn sharpen_composite(
    composite: &Image,
    region: &Region,
    config: &AnalysisConfig,
) -> Result<Image> {
    let to_sharpen = composite.select(&config.sharpen_bands, "fusion sharpening")?;
    let pan = composite.try_band(&config.pan_band, "fusion sharpening")?;

    let mean = band_mean(&to_sharpen)?;
    let matched = histogram_match(pan, &mean, region, &config.pan_band)?;

    let mut sharpened = mean_injection(&to_sharpen, &matched)?;
    sharpened.push_band(matched_band_name(&config.pan_band), matched)?;
    Ok(sharpened)
}

/// Per-pixel difference `after − before`; invalid in either input is
/// invalid in the output.
pub fn grid_difference(after: &Grid<f64>, before: &Grid<f64>) -> Result<Grid<f64>> {
    if !after.same_grid_as(before) {
        return Err(Error::GridMismatch {
            left: "after".to_string(),
            right: "before".to_string(),
            detail: "differencing needs identical grids".to_string(),
        });
    }

    let (rows, cols) = after.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { after.get_unchecked(row, col) };
                let b = unsafe { before.get_unchecked(row, col) };
                if after.is_nodata(a) || before.is_nodata(b) {
                    continue;
                }
                row_data[col] = a - b;
            }
            row_data
        })
        .collect();

    let mut output = after.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Keep strictly positive values, mask the rest.
fn positive_part(grid: &Grid<f64>) -> Result<Grid<f64>> {
    let (rows, cols) = grid.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let v = unsafe { grid.get_unchecked(row, col) };
                if !grid.is_nodata(v) && v > 0.0 {
                    row_data[col] = v;
                }
            }
            row_data
        })
        .collect();

    let mut output = grid.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use changelens_core::raster::GridTransform;
    use approx::assert_relative_eq;

    #[test]
    fn test_derive_change_reference_scenario() {
        // Region of 116.09 km²; water area shrinks from 4.2405 to 4.1787 km²
        let (area_change, percentage) =
            IndexChange::derive_change(4.2405, 4.1787, 116.09);

        assert_relative_eq!(area_change, -0.0618, epsilon = 1e-10);
        assert_relative_eq!(percentage, -0.0532, epsilon = 1e-4);
    }

    #[test]
    fn test_derive_change_signs() {
        let (growth, pct) = IndexChange::derive_change(1.0, 3.0, 100.0);
        assert_relative_eq!(growth, 2.0);
        assert_relative_eq!(pct, 2.0);

        let (zero, zero_pct) = IndexChange::derive_change(2.5, 2.5, 100.0);
        assert_eq!(zero, 0.0);
        assert_eq!(zero_pct, 0.0);
    }

    fn make_band(rows: usize, cols: usize, value: f64) -> Grid<f64> {
        let mut g = Grid::filled(rows, cols, value);
        g.set_transform(GridTransform::new(0.0, rows as f64, 1.0, -1.0));
        g
    }

    #[test]
    fn test_grid_difference() {
        let before = make_band(4, 4, 0.2);
        let after = make_band(4, 4, 0.5);

        let diff = grid_difference(&after, &before).unwrap();
        assert_relative_eq!(diff.get(1, 1).unwrap(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_difference_mask_propagates() {
        let mut before = make_band(4, 4, 0.2);
        before.set(2, 2, f64::NAN).unwrap();
        let after = make_band(4, 4, 0.5);

        let diff = grid_difference(&after, &before).unwrap();
        assert!(diff.get(2, 2).unwrap().is_nan());
    }

    #[test]
    fn test_positive_part() {
        let mut grid = make_band(1, 3, 0.0);
        grid.set(0, 0, 0.4).unwrap();
        grid.set(0, 1, -0.4).unwrap();
        grid.set(0, 2, 0.0).unwrap();

        let pos = positive_part(&grid).unwrap();
        assert_relative_eq!(pos.get(0, 0).unwrap(), 0.4);
        assert!(pos.get(0, 1).unwrap().is_nan());
        assert!(pos.get(0, 2).unwrap().is_nan(), "zero is not positive change");
    }
}
