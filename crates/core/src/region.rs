//! Area-of-interest polygon.

use crate::crs::Crs;
use crate::error::{Error, Result};
use geo::{Area, ChamberlainDuquetteArea, Contains, LineString, Point, Polygon};

/// An immutable closed polygon defining the area of interest.
///
/// Vertices are ordered (longitude, latitude) pairs for geographic regions,
/// or (x, y) in linear units when constructed with a projected CRS. The ring
/// must be explicitly closed (first vertex == last vertex) and enclose a
/// non-zero area.
#[derive(Debug, Clone)]
pub struct Region {
    polygon: Polygon<f64>,
    crs: Crs,
}

impl Region {
    /// Create a geographic (WGS84) region from a closed ring of
    /// (longitude, latitude) vertices.
    pub fn new(vertices: Vec<(f64, f64)>) -> Result<Self> {
        Self::with_crs(vertices, Crs::wgs84())
    }

    /// Create a region whose vertices are expressed in the given CRS.
    pub fn with_crs(vertices: Vec<(f64, f64)>, crs: Crs) -> Result<Self> {
        if vertices.len() < 4 {
            return Err(Error::InvalidRegion(format!(
                "a closed ring needs at least 4 vertices, got {}",
                vertices.len()
            )));
        }

        let first = vertices[0];
        let last = vertices[vertices.len() - 1];
        if (first.0 - last.0).abs() > 1e-12 || (first.1 - last.1).abs() > 1e-12 {
            return Err(Error::InvalidRegion(
                "ring is not closed: first and last vertex differ".to_string(),
            ));
        }

        let polygon = Polygon::new(LineString::from(vertices), vec![]);
        if polygon.unsigned_area() <= 0.0 {
            return Err(Error::InvalidRegion(
                "ring encloses zero area".to_string(),
            ));
        }

        Ok(Self { polygon, crs })
    }

    /// The region's CRS.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Enclosed area in km².
    ///
    /// Geographic regions use the Chamberlain–Duquette spherical formula;
    /// projected regions use planar shoelace area in the CRS's linear units.
    pub fn area_km2(&self) -> f64 {
        let m2 = if self.crs.is_geographic() {
            self.polygon.chamberlain_duquette_unsigned_area()
        } else {
            self.polygon.unsigned_area()
        };
        m2 / 1.0e6
    }

    /// Whether a point (in the region's CRS) lies inside the polygon.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygon.contains(&Point::new(x, y))
    }

    /// Axis-aligned bounding box as (min_x, min_y, max_x, max_y).
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for coord in self.polygon.exterior().coords() {
            min_x = min_x.min(coord.x);
            min_y = min_y.min(coord.y);
            max_x = max_x.max(coord.x);
            max_y = max_y.max(coord.y);
        }

        (min_x, min_y, max_x, max_y)
    }

    /// Exterior ring vertices, closed.
    pub fn vertices(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.polygon.exterior().coords().map(|c| (c.x, c.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_m(side: f64) -> Region {
        Region::with_crs(
            vec![
                (0.0, 0.0),
                (side, 0.0),
                (side, side),
                (0.0, side),
                (0.0, 0.0),
            ],
            Crs::from_epsg(32633),
        )
        .unwrap()
    }

    #[test]
    fn test_open_ring_rejected() {
        let result = Region::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(result.is_err(), "unclosed ring should be rejected");
    }

    #[test]
    fn test_too_few_vertices_rejected() {
        let result = Region::new(vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_area_rejected() {
        let result = Region::new(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)]);
        assert!(result.is_err(), "degenerate ring should be rejected");
    }

    #[test]
    fn test_projected_area() {
        // 5 km x 5 km square in metres
        let region = square_m(5_000.0);
        assert_relative_eq!(region.area_km2(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_geographic_area_plausible() {
        // ~0.1 x 0.1 degree box near the equator: roughly 123 km²
        let region = Region::new(vec![
            (10.0, 0.0),
            (10.1, 0.0),
            (10.1, 0.1),
            (10.0, 0.1),
            (10.0, 0.0),
        ])
        .unwrap();

        let area = region.area_km2();
        assert!(
            area > 110.0 && area < 130.0,
            "expected ~123 km², got {area}"
        );
    }

    #[test]
    fn test_contains() {
        let region = square_m(100.0);
        assert!(region.contains(50.0, 50.0));
        assert!(!region.contains(150.0, 50.0));
    }

    #[test]
    fn test_bounding_box() {
        let region = square_m(100.0);
        let (min_x, min_y, max_x, max_y) = region.bounding_box();
        assert_relative_eq!(min_x, 0.0);
        assert_relative_eq!(min_y, 0.0);
        assert_relative_eq!(max_x, 100.0);
        assert_relative_eq!(max_y, 100.0);
    }
}
