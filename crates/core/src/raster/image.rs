//! Multi-band image type.

use crate::error::{Error, Result};
use crate::raster::Grid;

/// A named set of `f64` bands over one shared grid.
///
/// Invariants: band names are unique, and every band shares the first
/// band's geometry (dimensions, transform, CRS). Both are enforced at
/// insertion, so pixel-wise arithmetic over an `Image`'s bands is always
/// well defined.
#[derive(Debug, Clone, Default)]
pub struct Image {
    bands: Vec<(String, Grid<f64>)>,
}

impl Image {
    /// Create an empty image.
    pub fn new() -> Self {
        Self { bands: Vec::new() }
    }

    /// Build an image from (name, band) pairs.
    pub fn from_bands(bands: Vec<(String, Grid<f64>)>) -> Result<Self> {
        let mut image = Self::new();
        for (name, grid) in bands {
            image.push_band(name, grid)?;
        }
        Ok(image)
    }

    /// Append a band, enforcing name uniqueness and grid agreement.
    pub fn push_band(&mut self, name: impl Into<String>, grid: Grid<f64>) -> Result<()> {
        let name = name.into();

        if self.band(&name).is_some() {
            return Err(Error::InvalidParameter {
                name: "band",
                value: name,
                reason: "band name already present in image".to_string(),
            });
        }

        if let Some((first_name, first)) = self.bands.first() {
            if !first.same_grid_as(&grid) {
                return Err(Error::GridMismatch {
                    left: first_name.clone(),
                    right: name,
                    detail: "bands of one image must share extent, resolution and CRS"
                        .to_string(),
                });
            }
        }

        self.bands.push((name, grid));
        Ok(())
    }

    /// Builder-style variant of [`push_band`](Self::push_band).
    pub fn with_band(mut self, name: impl Into<String>, grid: Grid<f64>) -> Result<Self> {
        self.push_band(name, grid)?;
        Ok(self)
    }

    /// Look up a band by name.
    pub fn band(&self, name: &str) -> Option<&Grid<f64>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
    }

    /// Look up a band by name, failing with a stage-tagged `MissingBand`.
    pub fn try_band(&self, name: &str, stage: &'static str) -> Result<&Grid<f64>> {
        self.band(name).ok_or_else(|| Error::MissingBand {
            band: name.to_string(),
            stage,
        })
    }

    /// Band names in insertion order.
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Whether the image has no bands.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Iterate over (name, band) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Grid<f64>)> {
        self.bands.iter().map(|(n, g)| (n.as_str(), g))
    }

    /// The shared grid geometry, taken from the first band.
    pub fn template(&self) -> Option<&Grid<f64>> {
        self.bands.first().map(|(_, g)| g)
    }

    /// Select a subset of bands by name into a new image.
    pub fn select(&self, names: &[String], stage: &'static str) -> Result<Image> {
        let mut out = Image::new();
        for name in names {
            let band = self.try_band(name, stage)?;
            out.push_band(name.clone(), band.clone())?;
        }
        Ok(out)
    }
}
