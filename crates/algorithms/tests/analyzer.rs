//! End-to-end analyzer run over a synthetic bi-temporal scene pair.
//!
//! Builds two epochs on a 20x20 UTM grid with 10 m pixels (each pixel is
//! exactly 1e-4 km²): a water patch in the north-west corner that shrinks
//! between epochs, a cloudy duplicate observation per epoch whose garbage
//! values must be masked away, and a gradient pan band for sharpening.

use changelens_algorithms::prelude::*;
use changelens_core::{Crs, Error, Region};
use changelens_core::raster::{Grid, GridTransform};

const UTM: u32 = 32633;
const ROWS: usize = 20;
const COLS: usize = 20;

/// Pre-event water patch: rows 0..5, cols 0..5 (25 pixels).
fn water_pre(row: usize, col: usize) -> bool {
    row < 5 && col < 5
}

/// Post-event water patch: rows 0..4, cols 0..4 (16 pixels).
fn water_post(row: usize, col: usize) -> bool {
    row < 4 && col < 4
}

fn make_grid(f: impl Fn(usize, usize) -> f64) -> Grid<f64> {
    let mut g: Grid<f64> = Grid::new(ROWS, COLS);
    g.set_crs(Crs::from_epsg(UTM));
    g.set_transform(GridTransform::new(0.0, ROWS as f64 * 10.0, 10.0, -10.0));
    for row in 0..ROWS {
        for col in 0..COLS {
            g.set(row, col, f(row, col)).unwrap();
        }
    }
    g
}

/// One clean observation: water pixels are wet, the rest vegetated land.
fn observation(water: fn(usize, usize) -> bool) -> Image {
    Image::new()
        .with_band("scl", make_grid(|_, _| 4.0))
        .unwrap()
        .with_band(
            "red",
            make_grid(|_, col| 0.10 + col as f64 * 0.001),
        )
        .unwrap()
        .with_band(
            "green",
            make_grid(move |r, c| if water(r, c) { 0.40 } else { 0.10 }),
        )
        .unwrap()
        .with_band("blue", make_grid(|row, _| 0.08 + row as f64 * 0.001))
        .unwrap()
        .with_band(
            "nir",
            make_grid(move |r, c| if water(r, c) { 0.05 } else { 0.50 }),
        )
        .unwrap()
        .with_band("swir", make_grid(|_, _| 0.20))
        .unwrap()
        .with_band("pan", make_grid(|row, col| 0.20 + (row + col) as f64 * 0.005))
        .unwrap()
}

/// Same scene, but a cloud bank over the water patch carrying garbage values.
fn cloudy_observation(water: fn(usize, usize) -> bool) -> Image {
    Image::new()
        .with_band(
            "scl",
            make_grid(move |r, c| if water(r, c) { 9.0 } else { 4.0 }),
        )
        .unwrap()
        .with_band(
            "red",
            make_grid(move |r, c| {
                if water(r, c) {
                    99.0
                } else {
                    0.10 + c as f64 * 0.001
                }
            }),
        )
        .unwrap()
        .with_band(
            "green",
            make_grid(move |r, c| if water(r, c) { 99.0 } else { 0.10 }),
        )
        .unwrap()
        .with_band(
            "blue",
            make_grid(move |r, c| {
                if water(r, c) {
                    99.0
                } else {
                    0.08 + r as f64 * 0.001
                }
            }),
        )
        .unwrap()
        .with_band(
            "nir",
            make_grid(move |r, c| if water(r, c) { 99.0 } else { 0.50 }),
        )
        .unwrap()
        .with_band("swir", make_grid(|_, _| 0.20))
        .unwrap()
        .with_band(
            "pan",
            make_grid(|row, col| 0.20 + (row + col) as f64 * 0.005),
        )
        .unwrap()
}

/// Coastal DEM: elevation climbs with the row index, 0 m at the top edge.
fn elevation() -> Grid<f64> {
    make_grid(|row, _| row as f64 * 5.0)
}

fn covering_region() -> Region {
    let w = COLS as f64 * 10.0;
    let h = ROWS as f64 * 10.0;
    Region::with_crs(
        vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h), (0.0, 0.0)],
        Crs::from_epsg(UTM),
    )
    .unwrap()
}

#[test]
fn full_run_reports_water_loss_and_risk() {
    let pre = vec![observation(water_pre), cloudy_observation(water_pre)];
    let post = vec![observation(water_post), cloudy_observation(water_post)];
    let region = covering_region();
    let config = AnalysisConfig::default();

    let assessment = analyze(&pre, &post, &elevation(), &region, &config).unwrap();

    // Region area: 200 m x 200 m = 0.04 km²
    assert!((assessment.region_area_km2 - 0.04).abs() < 1e-12);

    // The cloudy duplicate must not leak into the composite
    let red = assessment.pre_composite.band("red").unwrap();
    assert!((red.get(0, 0).unwrap() - 0.10).abs() < 1e-9);

    // Water: 25 pixels before, 16 after, each 1e-4 km²
    let water = assessment.index_change(IndexKind::Water).unwrap();
    assert!((water.pre_area_km2 - 0.0025).abs() < 1e-12);
    assert!((water.post_area_km2 - 0.0016).abs() < 1e-12);
    assert!((water.area_change_km2 + 0.0009).abs() < 1e-12);
    assert!(water.percentage_change < 0.0);

    // Vegetation gains exactly the 9 pixels the water lost
    let veg = assessment.index_change(IndexKind::Vegetation).unwrap();
    assert!((veg.area_change_km2 - 0.0009).abs() < 1e-12);

    assert_eq!(assessment.indices.len(), 3);
}

#[test]
fn new_water_masks_everything_but_gains() {
    // Reverse the epochs so water grows: the 9 gained pixels show up
    let pre = vec![observation(water_post)];
    let post = vec![observation(water_pre)];
    let region = covering_region();
    let config = AnalysisConfig::default();

    let assessment = analyze(&pre, &post, &elevation(), &region, &config).unwrap();

    let mut positive = 0;
    for row in 0..ROWS {
        for col in 0..COLS {
            let v = assessment.new_water.get(row, col).unwrap();
            if !v.is_nan() {
                assert!(v > 0.0);
                positive += 1;
                assert!(water_pre(row, col) && !water_post(row, col));
            }
        }
    }
    assert_eq!(positive, 9);
}

#[test]
fn sharpened_output_carries_matched_band() {
    let pre = vec![observation(water_pre)];
    let post = vec![observation(water_post)];
    let region = covering_region();
    let config = AnalysisConfig::default();

    let assessment = analyze(&pre, &post, &elevation(), &region, &config).unwrap();

    let names = assessment.pansharpened.band_names();
    assert!(names.contains(&"red"));
    assert!(names.contains(&"green"));
    assert!(names.contains(&"blue"));
    assert!(names.contains(&"pan_matched"));
    // The raw classification and spectral extras stay out of the sharpened set
    assert!(!names.contains(&"scl"));
    assert!(!names.contains(&"nir"));
}

#[test]
fn risk_tracks_elevation_bands() {
    let pre = vec![observation(water_pre)];
    let post = vec![observation(water_post)];
    let region = covering_region();
    let config = AnalysisConfig::default();

    let assessment = analyze(&pre, &post, &elevation(), &region, &config).unwrap();

    // Row 0 is at 0 m (High), row 5 at 25 m (Medium), row 15 at 75 m (Low)
    assert_eq!(assessment.risk.get(0, 0).unwrap(), RiskClass::High.code());
    assert_eq!(assessment.risk.get(5, 0).unwrap(), RiskClass::Medium.code());
    assert_eq!(assessment.risk.get(15, 0).unwrap(), RiskClass::Low.code());
}

#[test]
fn flat_pan_band_aborts_the_run() {
    // A constant pan band has no range to match against; the analyzer must
    // fail the whole run rather than emit an unsharpened bundle.
    let flat = make_grid(|_, _| 0.3);
    let mut pre = Image::new();
    for (name, band) in observation(water_pre).iter() {
        if name == "pan" {
            pre.push_band(name, flat.clone()).unwrap();
        } else {
            pre.push_band(name, band.clone()).unwrap();
        }
    }

    let err = analyze(
        &[pre],
        &[observation(water_post)],
        &elevation(),
        &covering_region(),
        &AnalysisConfig::default(),
    )
    .unwrap_err();

    match err {
        Error::DegenerateRange { band, .. } => assert_eq!(band, "pan"),
        other => panic!("expected DegenerateRange, got {other:?}"),
    }
}
