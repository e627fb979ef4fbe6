//! Driver runs against an in-memory repository and a recording export sink.
//!
//! Scenes live on a 10x10 UTM grid with 10 m pixels; a 2x2 water patch
//! drains completely between epochs.

use std::cell::Cell;

use changelens_algorithms::config::AnalysisConfig;
use changelens_algorithms::indices::IndexKind;
use changelens_algorithms::masking::SceneMaskParams;
use changelens_catalog::{
    CatalogError, ElevationExpr, EpochQuery, ExportJob, ExportSink, ExportTicket,
    ImageryRepository, PipelineDriver, Result, RetryPolicy, SceneExpr,
};
use changelens_core::raster::{Grid, GridTransform, Image};
use changelens_core::{Crs, Region};

const UTM: u32 = 32633;
const SIZE: usize = 10;

fn make_grid(f: impl Fn(usize, usize) -> f64) -> Grid<f64> {
    let mut g: Grid<f64> = Grid::new(SIZE, SIZE);
    g.set_crs(Crs::from_epsg(UTM));
    g.set_transform(GridTransform::new(0.0, SIZE as f64 * 10.0, 10.0, -10.0));
    for row in 0..SIZE {
        for col in 0..SIZE {
            g.set(row, col, f(row, col)).unwrap();
        }
    }
    g
}

/// Wet in the pre epoch only: the 2x2 corner patch.
fn observation(wet: bool) -> Image {
    let water = move |r: usize, c: usize| wet && r < 2 && c < 2;
    Image::new()
        .with_band("scl", make_grid(|_, _| 4.0))
        .unwrap()
        .with_band("red", make_grid(|_, col| 0.10 + col as f64 * 0.002))
        .unwrap()
        .with_band(
            "green",
            make_grid(move |r, c| if water(r, c) { 0.40 } else { 0.10 }),
        )
        .unwrap()
        .with_band("blue", make_grid(|row, _| 0.08 + row as f64 * 0.002))
        .unwrap()
        .with_band(
            "nir",
            make_grid(move |r, c| if water(r, c) { 0.05 } else { 0.50 }),
        )
        .unwrap()
        .with_band("swir", make_grid(|_, _| 0.20))
        .unwrap()
        .with_band("pan", make_grid(|row, col| 0.20 + (row + col) as f64 * 0.01))
        .unwrap()
}

fn covering_region() -> Region {
    let extent = SIZE as f64 * 10.0;
    Region::with_crs(
        vec![
            (0.0, 0.0),
            (extent, 0.0),
            (extent, extent),
            (0.0, extent),
            (0.0, 0.0),
        ],
        Crs::from_epsg(UTM),
    )
    .unwrap()
}

/// In-memory repository; optionally fails the first N calls transiently.
struct MockRepository {
    fail_first: Cell<u32>,
    scene_fetches: Cell<u32>,
    elevation_fetches: Cell<u32>,
    expected_elevation_scale: Cell<Option<f64>>,
}

impl MockRepository {
    fn new() -> Self {
        Self {
            fail_first: Cell::new(0),
            scene_fetches: Cell::new(0),
            elevation_fetches: Cell::new(0),
            expected_elevation_scale: Cell::new(None),
        }
    }

    fn failing_first(n: u32) -> Self {
        let repo = Self::new();
        repo.fail_first.set(n);
        repo
    }

    fn maybe_fail(&self) -> Result<()> {
        let remaining = self.fail_first.get();
        if remaining > 0 {
            self.fail_first.set(remaining - 1);
            return Err(CatalogError::ServiceUnavailable("503".to_string()));
        }
        Ok(())
    }
}

impl ImageryRepository for MockRepository {
    fn fetch_scenes(&self, query: &EpochQuery, _region: &Region) -> Result<Vec<Image>> {
        self.maybe_fail()?;
        self.scene_fetches.set(self.scene_fetches.get() + 1);
        // The pre-event window is wet, the post-event window dry
        let wet = query.datetime.starts_with("2023-01");
        Ok(vec![observation(wet), observation(wet)])
    }

    fn fetch_elevation(&self, _region: &Region, scale: f64) -> Result<Grid<f64>> {
        self.maybe_fail()?;
        if let Some(expected) = self.expected_elevation_scale.get() {
            assert!(
                (scale - expected).abs() < 1e-9,
                "DEM fetched at {scale}, expected {expected}"
            );
        }
        self.elevation_fetches.set(self.elevation_fetches.get() + 1);
        Ok(make_grid(|row, _| row as f64 * 8.0))
    }
}

#[derive(Default)]
struct RecordingSink {
    jobs: Vec<String>,
}

impl ExportSink for RecordingSink {
    fn start_export(&mut self, job: &ExportJob, image: &Image, _region: &Region) -> Result<ExportTicket> {
        assert!(!image.is_empty());
        if job.name == "risk" {
            // The ordinal codes must survive the hand-off as a float band
            let band = image.band("risk").expect("risk export carries its band");
            let v = band.get(0, 0).unwrap();
            assert!(v.is_nan() || (1.0..=3.0).contains(&v), "bad risk code {v}");
        }
        self.jobs.push(job.name.clone());
        Ok(ExportTicket {
            job_name: job.name.clone(),
        })
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: std::time::Duration::from_millis(1),
    }
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        pre_event: changelens_algorithms::config::DateRange::new("2023-01-01", "2023-02-01"),
        post_event: changelens_algorithms::config::DateRange::new("2023-03-01", "2023-04-01"),
        ..AnalysisConfig::default()
    }
}

#[test]
fn full_run_produces_assessment_layers_and_exports() {
    let repo = MockRepository::new();
    // The DEM must be sampled at its own scale, not the export scale
    repo.expected_elevation_scale
        .set(Some(config().elevation_scale));
    let mut driver = PipelineDriver::new(repo, RecordingSink::default());

    let run = driver.run(&covering_region(), &config()).unwrap();

    // 4 water pixels drained, each 1e-4 km²
    let water = run.assessment.index_change(IndexKind::Water).unwrap();
    assert!((water.pre_area_km2 - 0.0004).abs() < 1e-12);
    assert_eq!(water.post_area_km2, 0.0);
    assert!((water.area_change_km2 + 0.0004).abs() < 1e-12);

    // true-color + sharpened-detail + 3 index changes + new-water +
    // elevation + risk
    assert_eq!(run.layers.len(), 8);

    // Every bundle artifact gets a ticket: both composites, the sharpened
    // scene, 3 index differences, new_water, elevation and risk
    let names: Vec<&str> = run.exports.iter().map(|t| t.job_name.as_str()).collect();
    assert_eq!(names.len(), 9);
    for expected in [
        "pre_composite",
        "post_composite",
        "pansharpened",
        "ndvi_change",
        "ndwi_change",
        "ndbi_change",
        "new_water",
        "elevation",
        "risk",
    ] {
        assert!(names.contains(&expected), "missing export: {expected}");
    }
}

#[test]
fn transient_failures_are_retried() {
    let repo = MockRepository::failing_first(2);
    let mut driver =
        PipelineDriver::new(repo, RecordingSink::default()).with_retry(fast_retry());

    let run = driver.run(&covering_region(), &config()).unwrap();

    assert!(!run.exports.is_empty());
}

#[test]
fn exhausted_retries_fail_the_run() {
    // More consecutive failures than the policy tolerates
    let repo = MockRepository::failing_first(10);
    let mut driver =
        PipelineDriver::new(repo, RecordingSink::default()).with_retry(fast_retry());

    let err = driver.run(&covering_region(), &config()).unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn scene_expr_defers_all_io() {
    let repo = MockRepository::new();
    let query = EpochQuery::new("sentinel-2-l2a", "2023-01-01/2023-02-01");

    let expr = SceneExpr::from_query(query)
        .masked(SceneMaskParams::default())
        .composited()
        .index(IndexKind::Water);

    // Building the expression touched nothing
    assert_eq!(repo.scene_fetches.get(), 0);

    let image = expr.materialize(&repo, &covering_region()).unwrap();
    assert_eq!(repo.scene_fetches.get(), 1);
    assert_eq!(image.band_names(), vec!["ndwi"]);

    // Wet corner, dry elsewhere
    let ndwi = image.band("ndwi").unwrap();
    assert!(ndwi.get(0, 0).unwrap() > 0.2);
    assert!(ndwi.get(5, 5).unwrap() < 0.0);

    // Elevation is just as lazy
    let dem = ElevationExpr::at_scale(10.0);
    assert_eq!(repo.elevation_fetches.get(), 0);
    dem.materialize(&repo, &covering_region()).unwrap();
    assert_eq!(repo.elevation_fetches.get(), 1);
}
