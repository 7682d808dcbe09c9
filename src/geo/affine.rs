//! Six-coefficient affine transform from pixel (column, row) to projected
//! coordinates:
//!
//! ```text
//! X = a*col + b*row + c
//! Y = d*col + e*row + f
//! ```

use serde::{Deserialize, Serialize};

use super::crs::{self, Epsg};
use crate::error::GeolabelError;
use crate::readers::GroundControlPoint;

/// Affine pixel → projected-CRS transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform with the given origin and pixel size.
    pub fn from_origin(west: f64, north: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, west, 0.0, -pixel_height, north)
    }

    /// Builds a transform from a stored coefficient list.
    ///
    /// Returns `None` unless exactly six coefficients are given.
    pub fn from_coeffs(coeffs: &[f64]) -> Option<Self> {
        match *coeffs {
            [a, b, c, d, e, f] => Some(Self::new(a, b, c, d, e, f)),
            _ => None,
        }
    }

    pub fn coeffs(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Maps a pixel position to projected coordinates.
    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// The projected → pixel transform, or `None` if this one is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self::new(
            self.e / det,
            -self.b / det,
            (self.b * self.f - self.e * self.c) / det,
            -self.d / det,
            self.a / det,
            (self.d * self.c - self.a * self.f) / det,
        ))
    }

    /// Projected bounding box `(min_x, min_y, max_x, max_y)` of an image of
    /// the given size.
    pub fn bounds(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let (w, h) = (f64::from(width), f64::from(height));
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(w, h),
            self.apply(0.0, h),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Least-squares fit of a pixel → Web Mercator transform to ground
    /// control points.
    ///
    /// The returned CRS is always EPSG:3857.
    ///
    /// # Errors
    /// [`GeolabelError::InsufficientGcps`] with fewer than three points,
    /// [`GeolabelError::DegenerateGcps`] when the pixel positions are
    /// collinear or a point cannot be projected.
    pub fn from_gcps(gcps: &[GroundControlPoint]) -> Result<(Self, Epsg), GeolabelError> {
        if gcps.len() < 3 {
            return Err(GeolabelError::InsufficientGcps { count: gcps.len() });
        }

        let mut targets = Vec::with_capacity(gcps.len());
        for gcp in gcps {
            let projected =
                crs::lonlat_to_mercator(gcp.lon, gcp.lat).ok_or(GeolabelError::DegenerateGcps)?;
            targets.push(projected);
        }

        // Centre the pixel positions so the normal equations decouple the
        // translation term and stay well conditioned.
        let n = gcps.len() as f64;
        let mean_col = gcps.iter().map(|g| g.pixel_x).sum::<f64>() / n;
        let mean_row = gcps.iter().map(|g| g.pixel_y).sum::<f64>() / n;
        let mean_x = targets.iter().map(|t| t.0).sum::<f64>() / n;
        let mean_y = targets.iter().map(|t| t.1).sum::<f64>() / n;

        let (mut suu, mut suv, mut svv) = (0.0, 0.0, 0.0);
        let (mut sux, mut svx, mut suy, mut svy) = (0.0, 0.0, 0.0, 0.0);
        for (gcp, &(x, y)) in gcps.iter().zip(&targets) {
            let u = gcp.pixel_x - mean_col;
            let v = gcp.pixel_y - mean_row;
            let (x, y) = (x - mean_x, y - mean_y);
            suu += u * u;
            suv += u * v;
            svv += v * v;
            sux += u * x;
            svx += v * x;
            suy += u * y;
            svy += v * y;
        }

        let det = suu * svv - suv * suv;
        if !det.is_finite() || det <= 1e-12 * suu * svv || suu == 0.0 || svv == 0.0 {
            return Err(GeolabelError::DegenerateGcps);
        }

        let a = (sux * svv - svx * suv) / det;
        let b = (svx * suu - sux * suv) / det;
        let d = (suy * svv - svy * suv) / det;
        let e = (svy * suu - suy * suv) / det;
        let c = mean_x - a * mean_col - b * mean_row;
        let f = mean_y - d * mean_col - e * mean_row;

        Ok((Self::new(a, b, c, d, e, f), Epsg::WEB_MERCATOR))
    }
}
