//! Coordinate reference system identity.
//!
//! ChangeLens does not implement projection math; a CRS here is an EPSG
//! identity used to decide whether two grids share a coordinate space and
//! whether coordinates are angular (degrees) or linear (metres).

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG-keyed coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// Create a CRS from an EPSG code.
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic (EPSG:4326).
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// The EPSG code.
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Whether coordinates are geographic degrees rather than linear units.
    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }

    /// String identifier, e.g. `EPSG:4326`.
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}
