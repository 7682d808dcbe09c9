//! A single point annotation on one image.

use super::coord::Coord;
use super::ids::{LabelId, ObjectId, UniqueId};
use super::schema::{LabelRecord, SchemaVersion};
use super::space::{Normalized, Pixel};
use crate::geo::LatLon;

/// One annotated point.
///
/// Labels are created by [`LabelProject::add_label`](super::LabelProject::add_label)
/// and only change through the project (linking, unlinking, removal), which
/// keeps the project's indexes in step.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLabel {
    pub(crate) id: LabelId,
    pub(crate) class_name: String,
    pub(crate) pixel: Coord<Pixel>,
    pub(crate) position: LatLon,
    pub(crate) unique_id: UniqueId,
    pub(crate) object_id: ObjectId,
}

impl PointLabel {
    /// Creates a label that is its own singleton object.
    pub fn new(
        id: impl Into<LabelId>,
        class_name: impl Into<String>,
        pixel: Coord<Pixel>,
        position: LatLon,
    ) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
            pixel,
            position,
            unique_id: UniqueId::random(),
            object_id: ObjectId::random(),
        }
    }

    pub fn id(&self) -> LabelId {
        self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Position in the original source raster.
    pub fn pixel(&self) -> Coord<Pixel> {
        self.pixel
    }

    pub fn pixel_x(&self) -> f64 {
        self.pixel.x
    }

    pub fn pixel_y(&self) -> f64 {
        self.pixel.y
    }

    /// WGS84 position recorded when the label was created.
    pub fn position(&self) -> LatLon {
        self.position
    }

    pub fn lat(&self) -> f64 {
        self.position.lat
    }

    pub fn lon(&self) -> f64 {
        self.position.lon
    }

    pub fn unique_id(&self) -> UniqueId {
        self.unique_id
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Serializes the label for an image of the given size.
    ///
    /// Pixel positions are written as fractions when both dimensions are
    /// positive, otherwise as absolute pixels. Identifiers are always
    /// written.
    pub fn to_record(&self, image_width: u32, image_height: u32) -> LabelRecord {
        let stored = match self.pixel.to_normalized(image_width, image_height) {
            Some(fraction) => (fraction.x, fraction.y),
            None => (self.pixel.x, self.pixel.y),
        };

        LabelRecord {
            id: self.id.as_u64(),
            unique_id: Some(self.unique_id.to_string()),
            class_name: self.class_name.clone(),
            pixel_x: stored.0,
            pixel_y: stored.1,
            lon: self.position.lon,
            lat: self.position.lat,
            object_id: Some(self.object_id.to_string()),
            geodesic_distance: None,
        }
    }

    /// Rebuilds a label written by a document of `version`.
    ///
    /// Stored positions are fractions only from 2.1 on and only when the
    /// image dimensions are known. Missing or unreadable identifiers are
    /// replaced by fresh ones, so such labels load as singleton objects.
    pub fn from_record(
        record: &LabelRecord,
        image_width: u32,
        image_height: u32,
        version: SchemaVersion,
    ) -> Self {
        let stored_as_fraction =
            version.stores_fractional_pixels() && image_width > 0 && image_height > 0;
        let pixel = if stored_as_fraction {
            Coord::<Normalized>::new(record.pixel_x, record.pixel_y)
                .to_pixel(image_width, image_height)
        } else {
            Coord::new(record.pixel_x, record.pixel_y)
        };

        Self {
            id: LabelId::new(record.id),
            class_name: record.class_name.clone(),
            pixel,
            position: LatLon::new(record.lat, record.lon),
            unique_id: token_or_fresh(
                record.id,
                "unique_id",
                record.unique_id.as_deref(),
                UniqueId::parse,
            )
            .unwrap_or_else(UniqueId::random),
            object_id: token_or_fresh(
                record.id,
                "object_id",
                record.object_id.as_deref(),
                ObjectId::parse,
            )
            .unwrap_or_else(ObjectId::random),
        }
    }
}

fn token_or_fresh<T>(
    label_id: u64,
    field: &str,
    token: Option<&str>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let token = token.filter(|t| !t.is_empty())?;
    let parsed = parse(token);
    if parsed.is_none() {
        log::warn!("label {label_id}: unreadable {field} '{token}', minting a new one");
    }
    parsed
}
