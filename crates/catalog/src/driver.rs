//! Pipeline driver.
//!
//! Ties catalog access, the analyzer, styling and export into one run:
//! fetch both epochs and the DEM (with retry on transient outages), analyze,
//! style, submit exports. The driver owns its repository and sink; one
//! driver can serve many runs over different regions.

use changelens_algorithms::change::{analyze, ChangeAssessment};
use changelens_algorithms::config::AnalysisConfig;
use changelens_core::Region;
use tracing::info;

use crate::error::Result;
use crate::export::{export_assessment, ExportSink, ExportTicket};
use crate::layers::{assessment_layers, LayerStyle};
use crate::repository::{EpochQuery, ImageryRepository};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Default catalog collection queried for scenes.
pub const DEFAULT_CATALOG_ID: &str = "sentinel-2-l2a";

/// Everything one run produced.
#[derive(Debug)]
pub struct PipelineRun {
    pub assessment: ChangeAssessment,
    pub layers: Vec<LayerStyle>,
    pub exports: Vec<ExportTicket>,
}

pub struct PipelineDriver<R, S> {
    repository: R,
    sink: S,
    catalog_id: String,
    retry: RetryPolicy,
}

impl<R: ImageryRepository, S: ExportSink> PipelineDriver<R, S> {
    pub fn new(repository: R, sink: S) -> Self {
        Self {
            repository,
            sink,
            catalog_id: DEFAULT_CATALOG_ID.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_catalog_id(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = catalog_id.into();
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Execute one full run over `region`.
    pub fn run(&mut self, region: &Region, config: &AnalysisConfig) -> Result<PipelineRun> {
        let bands = scene_bands(config);
        let pre_query = self.epoch_query(config.pre_event.as_interval(), config, &bands);
        let post_query = self.epoch_query(config.post_event.as_interval(), config, &bands);

        info!(catalog = %self.catalog_id, "fetching epochs");
        let pre = retry_with_backoff(&self.retry, || {
            self.repository.fetch_scenes(&pre_query, region)
        })?;
        let post = retry_with_backoff(&self.retry, || {
            self.repository.fetch_scenes(&post_query, region)
        })?;
        let elevation = retry_with_backoff(&self.retry, || {
            self.repository
                .fetch_elevation(region, config.elevation_scale)
        })?;

        let assessment = analyze(&pre, &post, &elevation, region, config)?;
        let layers = assessment_layers(&assessment, &config.pan_band);
        let exports =
            export_assessment(&mut self.sink, &assessment, region, config.export_scale)?;

        Ok(PipelineRun {
            assessment,
            layers,
            exports,
        })
    }

    fn epoch_query(&self, datetime: String, config: &AnalysisConfig, bands: &[String]) -> EpochQuery {
        EpochQuery::new(self.catalog_id.clone(), datetime)
            .with_max_cloud_fraction(config.max_cloud_fraction)
            .with_bands(bands.iter().cloned())
    }
}

/// Every band a run touches: the classification layer, the sharpening
/// inputs, and the index band pairs, deduplicated in stable order.
fn scene_bands(config: &AnalysisConfig) -> Vec<String> {
    use changelens_algorithms::indices::IndexKind;

    let mut bands = vec![config.scene_mask.classification_band.clone()];
    bands.extend(config.sharpen_bands.iter().cloned());
    bands.push(config.pan_band.clone());
    for kind in IndexKind::ALL {
        let (a, b) = kind.band_pair();
        bands.push(a.to_string());
        bands.push(b.to_string());
    }

    let mut seen = std::collections::HashSet::new();
    bands.retain(|b| seen.insert(b.clone()));
    bands
}
