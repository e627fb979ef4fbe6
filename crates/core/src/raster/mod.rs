//! Raster value model: grids, elements, georeferencing, multi-band images.

mod element;
mod grid;
mod image;
mod transform;

pub use element::GridElement;
pub use grid::Grid;
pub use image::Image;
pub use transform::GridTransform;
