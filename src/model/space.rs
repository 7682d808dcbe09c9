//! Marker types for the two image coordinate spaces a label moves between.

use std::fmt;

/// Absolute position in the original, untransformed source raster
/// (column, row), sub-pixel precision retained.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Position as a fraction of the source raster's width and height.
///
/// This is what project files store from schema 2.1 on, so labels survive
/// resized or retiled copies of the same image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
