//! # ChangeLens Catalog
//!
//! Imagery access and pipeline orchestration for ChangeLens.
//!
//! This crate keeps all service-facing concerns out of the analysis crates:
//! catalog queries and the repository abstraction, retry with exponential
//! backoff, lazy scene expressions, layer styling, fire-and-forget export,
//! and the [`PipelineDriver`] that runs the whole bi-temporal assessment.

pub mod driver;
pub mod error;
pub mod export;
pub mod layers;
pub mod lazy;
pub mod repository;
pub mod retry;

pub use driver::{PipelineDriver, PipelineRun, DEFAULT_CATALOG_ID};
pub use error::{CatalogError, Result};
pub use export::{export_assessment, risk_as_band, ExportJob, ExportSink, ExportTicket};
pub use layers::{assessment_layers, LayerStyle};
pub use lazy::{ElevationExpr, SceneExpr, SceneOp};
pub use repository::{EpochQuery, ImageryRepository};
pub use retry::{retry_with_backoff, RetryPolicy};
