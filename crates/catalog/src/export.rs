//! Fire-and-forget export of assessment artifacts.
//!
//! Exports are submitted, not awaited: a sink accepts a job and returns a
//! ticket immediately, and the run never blocks on or polls for delivery.
//! Failures surface on submission only.

use changelens_algorithms::change::ChangeAssessment;
use changelens_core::raster::{Grid, Image};
use changelens_core::Region;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// One export request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Artifact name, e.g. `pansharpened` or `ndwi_change`.
    pub name: String,
    /// Ground sample distance of the exported raster, CRS units.
    pub scale: f64,
}

impl ExportJob {
    pub fn new(name: impl Into<String>, scale: f64) -> Self {
        Self {
            name: name.into(),
            scale,
        }
    }
}

/// Receipt for a submitted job. Holds no completion state: delivery is the
/// sink's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTicket {
    pub job_name: String,
}

/// Destination for exported rasters.
pub trait ExportSink {
    /// Accept a job. Must return promptly; long-running delivery happens
    /// behind the sink.
    fn start_export(&mut self, job: &ExportJob, image: &Image, region: &Region) -> Result<ExportTicket>;
}

/// Submit every artifact of one assessment: both median composites, the
/// pansharpened scene, one single-band image per index difference, the
/// newly-wet highlight, the elevation raster, and the risk raster.
pub fn export_assessment(
    sink: &mut impl ExportSink,
    assessment: &ChangeAssessment,
    region: &Region,
    scale: f64,
) -> Result<Vec<ExportTicket>> {
    let mut tickets = Vec::new();

    tickets.push(sink.start_export(
        &ExportJob::new("pre_composite", scale),
        &assessment.pre_composite,
        region,
    )?);
    tickets.push(sink.start_export(
        &ExportJob::new("post_composite", scale),
        &assessment.post_composite,
        region,
    )?);
    tickets.push(sink.start_export(
        &ExportJob::new("pansharpened", scale),
        &assessment.pansharpened,
        region,
    )?);

    for change in &assessment.indices {
        let band = change.kind.band_name();
        let image = Image::new().with_band(band, change.difference.clone())?;
        tickets.push(sink.start_export(
            &ExportJob::new(format!("{band}_change"), scale),
            &image,
            region,
        )?);
    }

    let new_water = Image::new().with_band("new_water", assessment.new_water.clone())?;
    tickets.push(sink.start_export(&ExportJob::new("new_water", scale), &new_water, region)?);

    let elevation = Image::new().with_band("elevation", assessment.elevation.clone())?;
    tickets.push(sink.start_export(&ExportJob::new("elevation", scale), &elevation, region)?);

    let risk = Image::new().with_band("risk", risk_as_band(&assessment.risk)?)?;
    tickets.push(sink.start_export(&ExportJob::new("risk", scale), &risk, region)?);

    info!(count = tickets.len(), "exports submitted");
    Ok(tickets)
}

/// Risk codes as an f64 band, so the risk raster rides the same masked-float
/// image convention as every other export. Unclassified pixels become NaN.
pub fn risk_as_band(risk: &Grid<u8>) -> Result<Grid<f64>> {
    let (rows, cols) = risk.shape();
    let mut out = risk.with_same_meta::<f64>(rows, cols);
    out.set_nodata(Some(f64::NAN));

    for row in 0..rows {
        for col in 0..cols {
            let code = risk.get(row, col)?;
            let value = if risk.is_nodata(code) {
                f64::NAN
            } else {
                f64::from(code)
            };
            out.set(row, col, value)?;
        }
    }

    Ok(out)
}
