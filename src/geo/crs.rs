//! Coordinate reference systems and reprojection to and from WGS84.
//!
//! Full datum handling is the job of a geodesy backend; callers that have one
//! implement [`Reprojector`] for it. [`BuiltinReprojector`] covers the two
//! systems the labelling workflow produces itself: geographic WGS84 and the
//! spherical Web Mercator used for GCP-derived transforms.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use super::LatLon;

/// Semi-major axis of the WGS84 ellipsoid, the Web Mercator sphere radius.
const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// An EPSG coordinate reference system code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epsg(pub u32);

impl Epsg {
    /// Geographic WGS84 (longitude/latitude in degrees).
    pub const WGS84: Epsg = Epsg(4326);
    /// Spherical Web Mercator.
    pub const WEB_MERCATOR: Epsg = Epsg(3857);

    #[inline]
    pub fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl fmt::Display for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Converts between a projected CRS and WGS84.
///
/// Both directions return `None` when the CRS is not supported or the point
/// cannot be represented; that is "unavailable", not an error.
pub trait Reprojector {
    /// Projected `(x, y)` in `crs` to WGS84.
    fn to_wgs84(&self, crs: Epsg, x: f64, y: f64) -> Option<LatLon>;

    /// WGS84 to projected `(x, y)` in `crs`.
    fn from_wgs84(&self, crs: Epsg, position: LatLon) -> Option<(f64, f64)>;
}

/// Closed-form reprojection for EPSG:4326 and EPSG:3857.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinReprojector;

impl Reprojector for BuiltinReprojector {
    fn to_wgs84(&self, crs: Epsg, x: f64, y: f64) -> Option<LatLon> {
        match crs {
            Epsg::WGS84 => Some(LatLon::new(y, x)),
            Epsg::WEB_MERCATOR => {
                mercator_to_lonlat(x, y).map(|(lon, lat)| LatLon::new(lat, lon))
            }
            other => {
                log::debug!("no builtin projection for {other}");
                None
            }
        }
    }

    fn from_wgs84(&self, crs: Epsg, position: LatLon) -> Option<(f64, f64)> {
        match crs {
            Epsg::WGS84 => Some((position.lon, position.lat)),
            Epsg::WEB_MERCATOR => lonlat_to_mercator(position.lon, position.lat),
            other => {
                log::debug!("no builtin projection for {other}");
                None
            }
        }
    }
}

/// Web Mercator metres to `(lon, lat)` degrees.
pub(crate) fn mercator_to_lonlat(x: f64, y: f64) -> Option<(f64, f64)> {
    let lon = (x / MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / MERCATOR_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
}

/// `(lon, lat)` degrees to Web Mercator metres; `None` at the poles.
pub(crate) fn lonlat_to_mercator(lon: f64, lat: f64) -> Option<(f64, f64)> {
    if lat.abs() >= 90.0 {
        return None;
    }
    let x = MERCATOR_RADIUS_M * lon.to_radians();
    let y = MERCATOR_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x.is_finite() && y.is_finite()).then_some((x, y))
}
