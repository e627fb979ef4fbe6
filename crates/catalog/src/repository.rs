//! Imagery repository abstraction.
//!
//! The pipeline never talks to a concrete imagery service directly; it goes
//! through [`ImageryRepository`], so drivers can run against a remote
//! catalog, a local cache, or an in-memory fixture interchangeably.

use changelens_core::raster::{Grid, Image};
use changelens_core::Region;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A catalog query for one epoch's observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochQuery {
    /// Catalog collection identifier, e.g. `sentinel-2-l2a`.
    pub catalog_id: String,
    /// Observation window as an interval, e.g. `2023-01-01/2023-02-01`.
    pub datetime: String,
    /// Scenes with a larger cloudy fraction are filtered out server-side.
    pub max_cloud_fraction: f64,
    /// Bands each returned scene must carry.
    pub bands: Vec<String>,
}

impl EpochQuery {
    pub fn new(catalog_id: impl Into<String>, datetime: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            datetime: datetime.into(),
            max_cloud_fraction: 1.0,
            bands: Vec::new(),
        }
    }

    pub fn with_max_cloud_fraction(mut self, fraction: f64) -> Self {
        self.max_cloud_fraction = fraction;
        self
    }

    pub fn with_bands(mut self, bands: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.bands = bands.into_iter().map(Into::into).collect();
        self
    }
}

/// Access to scene and elevation imagery over a region.
///
/// `fetch_scenes` returns every observation matching the query, pre-aligned
/// to one grid; `fetch_elevation` returns a static DEM at `scale` ground
/// sample distance. Implementations signal transient outages with
/// [`CatalogError::ServiceUnavailable`](crate::CatalogError::ServiceUnavailable)
/// so callers can retry.
pub trait ImageryRepository {
    fn fetch_scenes(&self, query: &EpochQuery, region: &Region) -> Result<Vec<Image>>;

    fn fetch_elevation(&self, region: &Region, scale: f64) -> Result<Grid<f64>>;
}
