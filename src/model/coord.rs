//! Typed image coordinates using PhantomData for compile-time safety.

use std::marker::PhantomData;

use super::space::{Normalized, Pixel};

/// A 2D image coordinate tagged with the space it lives in.
///
/// `TSpace` is either [`Pixel`] or [`Normalized`], so a stored fraction can
/// never be handed to code expecting absolute pixels.
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Coord<Pixel> {
    /// Converts to fractions of the given dimensions.
    ///
    /// Returns `None` unless both dimensions are positive.
    pub fn to_normalized(self, width: u32, height: u32) -> Option<Coord<Normalized>> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Coord::new(
            self.x / f64::from(width),
            self.y / f64::from(height),
        ))
    }
}

impl Coord<Normalized> {
    /// Scales fractions back to absolute pixels of the given dimensions.
    pub fn to_pixel(self, width: u32, height: u32) -> Coord<Pixel> {
        Coord::new(self.x * f64::from(width), self.y * f64::from(height))
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
