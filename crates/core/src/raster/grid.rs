//! Single-band grid type.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::raster::{GridElement, GridTransform};
use ndarray::{Array2, ArrayView2};

/// A georeferenced single-band 2-D grid.
///
/// `Grid<T>` stores samples of type `T` in row-major order with an
/// axis-aligned transform and a CRS. Validity is tracked through the nodata
/// convention: floating-point grids mark invalid pixels with NaN, integer
/// grids with an explicit nodata value. Invalid pixels are excluded from
/// every statistic and area sum downstream.
#[derive(Debug, Clone)]
pub struct Grid<T: GridElement> {
    data: Array2<T>,
    transform: GridTransform,
    crs: Crs,
    nodata: Option<T>,
}

impl<T: GridElement> Grid<T> {
    /// Create a grid filled with zeros on the default transform.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GridTransform::default(),
            crs: Crs::default(),
            nodata: None,
        }
    }

    /// Create a grid filled with a specific value.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GridTransform::default(),
            crs: Crs::default(),
            nodata: None,
        }
    }

    /// Create a grid from a flat row-major vector.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            transform: GridTransform::default(),
            crs: Crs::default(),
            nodata: None,
        })
    }

    /// Create a zeroed grid of a possibly different element type carrying
    /// this grid's georeferencing.
    pub fn with_same_meta<U: GridElement>(&self, rows: usize, cols: usize) -> Grid<U> {
        Grid {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs,
            nodata: None,
        }
    }

    // Dimensions

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid has zero cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get the value at (row, col).
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get the value at (row, col) without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set the value at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// View of the underlying data.
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Reference to the underlying array.
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Mutable reference to the underlying array.
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    // Metadata

    /// The grid transform.
    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    /// Set the grid transform.
    pub fn set_transform(&mut self, transform: GridTransform) {
        self.transform = transform;
    }

    /// The CRS.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Set the CRS.
    pub fn set_crs(&mut self, crs: Crs) {
        self.crs = crs;
    }

    /// The no-data value.
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value.
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Ground sample distance (assumes square cells).
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Coordinate conversion

    /// Pixel center in grid coordinates.
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Fractional pixel coordinates for a point.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    // Validity

    /// Check if a value is no-data.
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Count of valid cells.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }

    /// Whether another grid shares this one's geometry: same dimensions,
    /// transform and CRS. Pixel-wise arithmetic requires this.
    pub fn same_grid_as<U: GridElement>(&self, other: &Grid<U>) -> bool {
        self.shape() == other.shape()
            && self.transform.approx_eq(other.transform(), 1e-9)
            && self.crs == other.crs()
    }

    // Ground area

    /// Ground area of a pixel in the given row, in km².
    ///
    /// Projected grids have constant pixel area; geographic grids scale the
    /// east-west extent by the cosine of the row's latitude.
    pub fn pixel_area_km2(&self, row: usize) -> f64 {
        let pw = self.transform.pixel_width.abs();
        let ph = self.transform.pixel_height.abs();

        if self.crs.is_geographic() {
            // Metres per degree on the WGS84 ellipsoid (mid-latitude values)
            const M_PER_DEG_LON_EQUATOR: f64 = 111_320.0;
            const M_PER_DEG_LAT: f64 = 110_574.0;

            let (_, lat) = self.transform.pixel_to_geo(0, row);
            let width_m = pw * M_PER_DEG_LON_EQUATOR * lat.to_radians().cos();
            let height_m = ph * M_PER_DEG_LAT;
            width_m * height_m / 1.0e6
        } else {
            pw * ph / 1.0e6
        }
    }
}
