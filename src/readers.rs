//! Reader identifiers and ground control points.
//!
//! A project never stores reader code, only the identifier the reader
//! registry resolves: `"default"` for native GeoTIFF, a builtin reader name,
//! or the path of an external reader script.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier stored for images read by the native GeoTIFF path.
pub const DEFAULT_READER: &str = "default";

/// Extension assumed for paths without a suffix.
pub const DEFAULT_EXTENSION: &str = "tif";

/// A resolved reader identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReaderSpec {
    /// Native GeoTIFF reading.
    Default,
    /// A reader shipped with the application, by module name.
    Builtin(String),
    /// An external reader script.
    Script(PathBuf),
}

impl ReaderSpec {
    /// Classifies a stored reader identifier.
    ///
    /// Identifiers containing a path separator or ending in `.py` name a
    /// script; `"default"` is the native reader; anything else is builtin.
    pub fn parse(identifier: &str) -> Self {
        if identifier == DEFAULT_READER {
            ReaderSpec::Default
        } else if identifier.contains('/')
            || identifier.contains('\\')
            || identifier.ends_with(".py")
        {
            ReaderSpec::Script(PathBuf::from(identifier))
        } else {
            ReaderSpec::Builtin(identifier.to_string())
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ReaderSpec::Default)
    }

    /// The identifier as written to project files.
    pub fn identifier(&self) -> String {
        match self {
            ReaderSpec::Default => DEFAULT_READER.to_string(),
            ReaderSpec::Builtin(name) => name.clone(),
            ReaderSpec::Script(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for ReaderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Lowercase file suffix without the dot, `"tif"` when the path has none.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// File stem of a path, used as the display name of images synthesized
/// without one.
pub fn display_name_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A pixel ↔ WGS84 correspondence returned by custom readers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundControlPoint {
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub lat: f64,
    pub lon: f64,
}

impl GroundControlPoint {
    /// Creates a GCP in the `[x, y, lat, lon]` order readers report.
    pub fn new(pixel_x: f64, pixel_y: f64, lat: f64, lon: f64) -> Self {
        Self {
            pixel_x,
            pixel_y,
            lat,
            lon,
        }
    }
}

impl From<[f64; 4]> for GroundControlPoint {
    fn from([x, y, lat, lon]: [f64; 4]) -> Self {
        Self::new(x, y, lat, lon)
    }
}
