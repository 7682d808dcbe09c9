//! On-disk schema of `.geolabel` project files.
//!
//! The document has gone through two layouts:
//!
//! - **label-centric** (< 2.0): a flat `labels` array where every label
//!   names its image, plus an optional `image_paths` list for images without
//!   labels;
//! - **image-centric** (>= 2.0): an `images` array, each image owning its
//!   labels. From 2.1 on, label pixel positions are stored as fractions of
//!   the image dimensions.
//!
//! Versions are compared numerically as `(major, minor)`, so `2.10` sorts
//! after `2.2`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::image::Corners;

/// A parsed `major.minor` schema version.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

impl SchemaVersion {
    /// Assumed when a document carries no `version` key.
    pub const LEGACY: SchemaVersion = SchemaVersion::new(1, 0);
    /// First image-centric layout.
    pub const IMAGE_CENTRIC: SchemaVersion = SchemaVersion::new(2, 0);
    /// First version storing pixel positions as fractions.
    pub const FRACTIONAL_PIXELS: SchemaVersion = SchemaVersion::new(2, 1);
    /// The version this build writes.
    pub const CURRENT: SchemaVersion = SchemaVersion::new(3, 2);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn is_image_centric(&self) -> bool {
        *self >= Self::IMAGE_CENTRIC
    }

    pub fn stores_fractional_pixels(&self) -> bool {
        *self >= Self::FRACTIONAL_PIXELS
    }

    /// True if this build knows how to read documents of this version.
    pub fn is_supported(&self) -> bool {
        self.major <= Self::CURRENT.major
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Error returned when a version string is not `major[.minor[...]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseVersionError(pub String);

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schema version '{}'", self.0)
    }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for SchemaVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_string());
        let mut parts = s.trim().split('.');

        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(err)?
            .parse::<u32>()
            .map_err(|_| err())?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| err())?,
            None => 0,
        };
        // Patch components are tolerated but carry no meaning.
        for rest in parts {
            rest.parse::<u32>().map_err(|_| err())?;
        }

        Ok(Self::new(major, minor))
    }
}

impl fmt::Debug for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaVersion({}.{})", self.major, self.minor)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Serialized form of a [`PointLabel`](super::PointLabel).
///
/// `pixel_x`/`pixel_y` hold fractions or absolute pixels depending on the
/// document version and whether the image dimensions are known. Older
/// writers used `x`/`y`; when both spellings are present `pixel_*` wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLabelRecord")]
pub struct LabelRecord {
    pub id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    pub class_name: String,

    pub pixel_x: f64,

    pub pixel_y: f64,

    pub lon: f64,

    pub lat: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Export-only: metres from the image's left edge on the label's row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geodesic_distance: Option<f64>,
}

/// Serialized form of an [`ImageData`](super::ImageData).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub path: String,

    pub name: String,

    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub labels: Vec<LabelRecord>,

    #[serde(default)]
    pub original_width: u32,

    #[serde(default)]
    pub original_height: u32,

    #[serde(default)]
    pub reader: BTreeMap<String, String>,

    /// Pre-3.0 single custom reader extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_ext: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affine_coeffs: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs_epsg: Option<u32>,

    /// Export-only: WGS84 position of each image corner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corners_wgs84: Option<Corners>,
}

/// Image-centric project document (>= 2.0).
///
/// `version` is only written. Readers take it from the raw document, where it
/// may be a string or a number.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default, skip_deserializing)]
    pub version: String,

    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub images: Vec<ImageRecord>,

    #[serde(rename = "_next_id", default = "first_label_id")]
    pub next_id: u64,

    /// Project-wide reader table written by 3.0; read for compatibility only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_readers: BTreeMap<String, String>,
}

/// Label-centric project document (< 2.0).
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LegacyProjectRecord {
    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub labels: Vec<LegacyLabelRecord>,

    #[serde(default)]
    pub image_paths: Vec<String>,

    #[serde(rename = "_next_id", default = "first_label_id")]
    pub next_id: u64,
}

/// Read side of [`LabelRecord`], keeping both pixel key spellings apart.
#[derive(Deserialize)]
struct RawLabelRecord {
    id: u64,
    #[serde(default)]
    unique_id: Option<String>,
    class_name: String,
    #[serde(default)]
    pixel_x: Option<f64>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    pixel_y: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    lon: f64,
    lat: f64,
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    geodesic_distance: Option<f64>,
}

impl From<RawLabelRecord> for LabelRecord {
    fn from(raw: RawLabelRecord) -> Self {
        Self {
            id: raw.id,
            unique_id: raw.unique_id,
            class_name: raw.class_name,
            pixel_x: pixel_key(raw.pixel_x, raw.x),
            pixel_y: pixel_key(raw.pixel_y, raw.y),
            lon: raw.lon,
            lat: raw.lat,
            object_id: raw.object_id,
            geodesic_distance: raw.geodesic_distance,
        }
    }
}

fn pixel_key(current: Option<f64>, old: Option<f64>) -> f64 {
    current.or(old).unwrap_or(0.0)
}

/// A label in the label-centric layout, carrying its image inline.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LegacyLabelRecord {
    pub id: u64,

    pub class_name: String,

    #[serde(default)]
    pixel_x: Option<f64>,

    #[serde(default)]
    x: Option<f64>,

    #[serde(default)]
    pixel_y: Option<f64>,

    #[serde(default)]
    y: Option<f64>,

    pub lon: f64,

    pub lat: f64,

    #[serde(default)]
    pub image_path: String,

    #[serde(default)]
    pub image_name: String,

    #[serde(default)]
    pub image_group: String,
}

impl LegacyLabelRecord {
    pub fn pixel(&self) -> (f64, f64) {
        (
            pixel_key(self.pixel_x, self.x),
            pixel_key(self.pixel_y, self.y),
        )
    }
}

fn first_label_id() -> u64 {
    1
}
