//! # ChangeLens Core
//!
//! Core types for the ChangeLens change-detection library.
//!
//! This crate provides:
//! - `Grid<T>`: generic single-band raster grid
//! - `Image`: named multi-band set over one shared grid
//! - `GridTransform`: axis-aligned georeferencing
//! - `Region`: area-of-interest polygon with geodesic area
//! - `Crs`: EPSG coordinate system identity
//! - The shared error vocabulary of the pipeline

pub mod crs;
pub mod error;
pub mod raster;
pub mod region;

pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{Grid, GridElement, GridTransform, Image};
pub use region::Region;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Grid, GridElement, GridTransform, Image};
    pub use crate::region::Region;
}
