//! Lazy scene expressions.
//!
//! A [`SceneExpr`] is an immutable description of "fetch these observations,
//! then apply this op chain". Building or extending one performs no I/O and
//! no raster math; every combinator returns a new expression with one more
//! op appended, and only [`SceneExpr::materialize`] touches the repository
//! and evaluates the chain. Expressions are cheap to clone and share.

use changelens_algorithms::align::{align_image, Resampling};
use changelens_algorithms::composite::median_composite;
use changelens_algorithms::indices::{spectral_index, IndexKind};
use changelens_algorithms::masking::{apply_scene_mask, SceneMaskParams};
use changelens_algorithms::matching::{histogram_match, matched_band_name};
use changelens_algorithms::sharpen::mean_injection;
use changelens_core::raster::{Grid, Image};
use changelens_core::Region;

use crate::error::{CatalogError, Result};
use crate::repository::{EpochQuery, ImageryRepository};

/// One deferred pipeline step.
#[derive(Debug, Clone)]
pub enum SceneOp {
    /// Apply scene-classification masking to every observation.
    Mask(SceneMaskParams),
    /// Collapse the observation stack into one median composite.
    Composite,
    /// Resample every band onto a new ground sample distance.
    Resample { scale: f64, method: Resampling },
    /// Histogram-match `band` onto `reference` over the materialization
    /// region, adding the `_matched` band; requires a composited scene.
    Match { band: String, reference: String },
    /// Mean-injection sharpen `bands` against `reference`; requires a
    /// composited scene.
    Sharpen { reference: String, bands: Vec<String> },
    /// Compute a spectral index; requires a composited scene.
    Index(IndexKind),
}

/// A deferred scene computation.
#[derive(Debug, Clone)]
pub struct SceneExpr {
    query: EpochQuery,
    ops: Vec<SceneOp>,
}

impl SceneExpr {
    /// Start an expression from a catalog query. No I/O happens here.
    pub fn from_query(query: EpochQuery) -> Self {
        Self {
            query,
            ops: Vec::new(),
        }
    }

    pub fn query(&self) -> &EpochQuery {
        &self.query
    }

    pub fn ops(&self) -> &[SceneOp] {
        &self.ops
    }

    fn with_op(mut self, op: SceneOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn masked(self, params: SceneMaskParams) -> Self {
        self.with_op(SceneOp::Mask(params))
    }

    pub fn composited(self) -> Self {
        self.with_op(SceneOp::Composite)
    }

    pub fn resampled(self, scale: f64, method: Resampling) -> Self {
        self.with_op(SceneOp::Resample { scale, method })
    }

    pub fn matched(self, band: impl Into<String>, reference: impl Into<String>) -> Self {
        self.with_op(SceneOp::Match {
            band: band.into(),
            reference: reference.into(),
        })
    }

    pub fn sharpened(
        self,
        reference: impl Into<String>,
        bands: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.with_op(SceneOp::Sharpen {
            reference: reference.into(),
            bands: bands.into_iter().map(Into::into).collect(),
        })
    }

    pub fn index(self, kind: IndexKind) -> Self {
        self.with_op(SceneOp::Index(kind))
    }

    /// Fetch the observations and evaluate the op chain.
    ///
    /// The result is a single image, so a stack that was never composited
    /// must hold exactly one observation.
    pub fn materialize(&self, repo: &impl ImageryRepository, region: &Region) -> Result<Image> {
        let mut stack = repo.fetch_scenes(&self.query, region)?;

        for op in &self.ops {
            match op {
                SceneOp::Mask(params) => {
                    stack = stack
                        .iter()
                        .map(|obs| apply_scene_mask(obs, params))
                        .collect::<changelens_core::Result<Vec<_>>>()?;
                }
                SceneOp::Composite => {
                    stack = vec![median_composite(&stack)?];
                }
                SceneOp::Resample { scale, method } => {
                    stack = stack
                        .iter()
                        .map(|obs| align_image(obs, *scale, *method))
                        .collect::<changelens_core::Result<Vec<_>>>()?;
                }
                SceneOp::Match { band, reference } => {
                    let mut scene = single(&mut stack)?;
                    let matched = histogram_match(
                        scene.try_band(band, "lazy match")?,
                        scene.try_band(reference, "lazy match")?,
                        region,
                        band,
                    )?;
                    scene.push_band(matched_band_name(band), matched)?;
                    stack = vec![scene];
                }
                SceneOp::Sharpen { reference, bands } => {
                    let scene = single(&mut stack)?;
                    let selected = scene.select(bands, "lazy sharpen")?;
                    let sharpened =
                        mean_injection(&selected, scene.try_band(reference, "lazy sharpen")?)?;
                    stack = vec![sharpened];
                }
                SceneOp::Index(kind) => {
                    let scene = single(&mut stack)?;
                    let grid = spectral_index(&scene, *kind)?;
                    stack = vec![Image::new().with_band(kind.band_name(), grid)?];
                }
            }
        }

        single(&mut stack)
    }
}

/// A deferred elevation fetch.
#[derive(Debug, Clone)]
pub struct ElevationExpr {
    scale: f64,
}

impl ElevationExpr {
    pub fn at_scale(scale: f64) -> Self {
        Self { scale }
    }

    pub fn materialize(&self, repo: &impl ImageryRepository, region: &Region) -> Result<Grid<f64>> {
        repo.fetch_elevation(region, self.scale)
    }
}

fn single(stack: &mut Vec<Image>) -> Result<Image> {
    match stack.len() {
        1 => Ok(stack.remove(0)),
        n => Err(CatalogError::Query(format!(
            "expected a single scene at this point in the chain, found {n}; \
             composite the stack first"
        ))),
    }
}
