//! Geocoding helpers consumed by [`ImageData`](crate::model::ImageData).
//!
//! - [`Affine`]: six-coefficient pixel → projected-CRS transform
//! - [`Reprojector`]: projected CRS ↔ WGS84, with a closed-form builtin for
//!   EPSG:4326 and EPSG:3857
//! - [`haversine_distance`]: great-circle distance on a fixed-radius sphere

mod affine;
mod crs;
mod haversine;

pub use affine::Affine;
pub use crs::{BuiltinReprojector, Epsg, Reprojector};
pub use haversine::{haversine_distance, EARTH_RADIUS_M};

use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true if both components are finite and within the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}
