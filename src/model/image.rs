//! One source raster, its labels, and its pixel ↔ geocoordinate transform.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::coord::Coord;
use super::label::PointLabel;
use super::schema::{ImageRecord, SchemaVersion};
use super::space::Pixel;
use crate::geo::{haversine_distance, Affine, BuiltinReprojector, Epsg, LatLon, Reprojector};
use crate::readers::{extension_of, DEFAULT_READER};

/// Reader identifier written for images whose record only had `reader_ext`.
const LEGACY_CUSTOM_READER: &str = "custom";

/// Affine transform together with the CRS it projects into.
///
/// Holding both in one value keeps the "both or neither" rule structural.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform {
    pub affine: Affine,
    pub crs: Epsg,
}

impl GeoTransform {
    pub fn new(affine: Affine, crs: Epsg) -> Self {
        Self { affine, crs }
    }
}

/// WGS84 positions of the four image corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: LatLon,
    pub top_right: LatLon,
    pub bottom_right: LatLon,
    pub bottom_left: LatLon,
}

/// Description of an image to register with a project.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSpec {
    pub path: String,
    pub name: String,
    pub group: String,
    pub original_width: u32,
    pub original_height: u32,
    pub reader: BTreeMap<String, String>,
    pub transform: Option<GeoTransform>,
}

impl ImageSpec {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            group: String::new(),
            original_width: 0,
            original_height: 0,
            reader: BTreeMap::new(),
            transform: None,
        }
    }

    /// Sets the slash-delimited display folder.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.original_width = width;
        self.original_height = height;
        self
    }

    /// Records which reader handles files with `extension`.
    pub fn with_reader(mut self, extension: impl Into<String>, reader: impl Into<String>) -> Self {
        self.reader.insert(extension.into(), reader.into());
        self
    }

    pub fn with_transform(mut self, affine: Affine, crs: Epsg) -> Self {
        self.transform = Some(GeoTransform::new(affine, crs));
        self
    }
}

/// A source raster and the labels placed on it.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub(crate) path: String,
    pub(crate) name: String,
    pub(crate) group: String,
    pub(crate) labels: Vec<PointLabel>,
    pub(crate) original_width: u32,
    pub(crate) original_height: u32,
    pub(crate) reader: BTreeMap<String, String>,
    pub(crate) transform: Option<GeoTransform>,
}

impl ImageData {
    pub(crate) fn from_spec(spec: ImageSpec) -> Self {
        Self {
            path: spec.path,
            name: spec.name,
            group: spec.group,
            labels: Vec::new(),
            original_width: spec.original_width,
            original_height: spec.original_height,
            reader: spec.reader,
            transform: spec.transform,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Labels in creation order.
    pub fn labels(&self) -> &[PointLabel] {
        &self.labels
    }

    pub fn original_width(&self) -> u32 {
        self.original_width
    }

    pub fn original_height(&self) -> u32 {
        self.original_height
    }

    /// Reader identifier per file extension.
    pub fn reader(&self) -> &BTreeMap<String, String> {
        &self.reader
    }

    pub fn transform(&self) -> Option<&GeoTransform> {
        self.transform.as_ref()
    }

    pub fn affine_coeffs(&self) -> Option<[f64; 6]> {
        self.transform.map(|t| t.affine.coeffs())
    }

    pub fn crs_epsg(&self) -> Option<Epsg> {
        self.transform.map(|t| t.crs)
    }

    pub fn is_georeferenced(&self) -> bool {
        self.transform.is_some()
    }

    /// WGS84 position of a pixel, or `None` without a usable transform.
    pub fn pixel_to_latlon(&self, pixel_x: f64, pixel_y: f64) -> Option<LatLon> {
        self.pixel_to_latlon_with(&BuiltinReprojector, pixel_x, pixel_y)
    }

    pub fn pixel_to_latlon_with(
        &self,
        reprojector: &impl Reprojector,
        pixel_x: f64,
        pixel_y: f64,
    ) -> Option<LatLon> {
        let transform = self.transform.as_ref()?;
        let (x, y) = transform.affine.apply(pixel_x, pixel_y);
        reprojector.to_wgs84(transform.crs, x, y)
    }

    /// Pixel position of a WGS84 point, or `None` without a usable transform.
    pub fn latlon_to_pixel(&self, lat: f64, lon: f64) -> Option<Coord<Pixel>> {
        self.latlon_to_pixel_with(&BuiltinReprojector, lat, lon)
    }

    pub fn latlon_to_pixel_with(
        &self,
        reprojector: &impl Reprojector,
        lat: f64,
        lon: f64,
    ) -> Option<Coord<Pixel>> {
        let transform = self.transform.as_ref()?;
        let (x, y) = reprojector.from_wgs84(transform.crs, LatLon::new(lat, lon))?;
        let (col, row) = transform.affine.inverse()?.apply(x, y);
        Some(Coord::new(col, row))
    }

    /// WGS84 corners of the image; `None` if the dimensions are unknown or
    /// any single corner cannot be transformed.
    pub fn corner_coords(&self) -> Option<Corners> {
        self.corner_coords_with(&BuiltinReprojector)
    }

    pub fn corner_coords_with(&self, reprojector: &impl Reprojector) -> Option<Corners> {
        if self.original_width == 0 || self.original_height == 0 {
            return None;
        }
        let w = f64::from(self.original_width);
        let h = f64::from(self.original_height);

        Some(Corners {
            top_left: self.pixel_to_latlon_with(reprojector, 0.0, 0.0)?,
            top_right: self.pixel_to_latlon_with(reprojector, w, 0.0)?,
            bottom_right: self.pixel_to_latlon_with(reprojector, w, h)?,
            bottom_left: self.pixel_to_latlon_with(reprojector, 0.0, h)?,
        })
    }

    /// Haversine distance from the left image edge, on the label's row, to
    /// the label's stored position.
    pub fn distance_from_left_edge(&self, label: &PointLabel) -> Option<f64> {
        let edge = self.pixel_to_latlon(0.0, label.pixel_y())?;
        Some(haversine_distance(edge, label.position()))
    }

    /// Serializes the image with its labels and the derived export fields.
    pub fn to_record(&self) -> ImageRecord {
        let labels = self
            .labels
            .iter()
            .map(|label| {
                let mut record = label.to_record(self.original_width, self.original_height);
                record.geodesic_distance = self
                    .distance_from_left_edge(label)
                    .map(|metres| (metres * 1000.0).round() / 1000.0);
                record
            })
            .collect();

        let reader = if self.reader.is_empty() {
            BTreeMap::from([(extension_of(&self.path), DEFAULT_READER.to_string())])
        } else {
            self.reader.clone()
        };

        ImageRecord {
            path: self.path.clone(),
            name: self.name.clone(),
            group: self.group.clone(),
            labels,
            original_width: self.original_width,
            original_height: self.original_height,
            reader,
            reader_ext: None,
            affine_coeffs: self.transform.map(|t| t.affine.coeffs().to_vec()),
            crs_epsg: self.transform.map(|t| t.crs.code()),
            corners_wgs84: self.corner_coords(),
        }
    }

    /// Rebuilds an image written by a document of `version`.
    ///
    /// A transform is only kept when six coefficients and a CRS are both
    /// present; anything else is dropped with a warning.
    pub fn from_record(record: &ImageRecord, version: SchemaVersion) -> Self {
        let width = record.original_width;
        let height = record.original_height;

        let mut reader = record.reader.clone();
        if reader.is_empty() {
            if let Some(ext) = record.reader_ext.as_deref().filter(|e| !e.is_empty()) {
                reader.insert(ext.to_string(), LEGACY_CUSTOM_READER.to_string());
            }
        }

        let transform = match (&record.affine_coeffs, record.crs_epsg) {
            (None, None) => None,
            (Some(coeffs), Some(code)) => match Affine::from_coeffs(coeffs) {
                Some(affine) => Some(GeoTransform::new(affine, Epsg(code))),
                None => {
                    log::warn!(
                        "image {}: expected 6 affine coefficients, found {}; transform dropped",
                        record.path,
                        coeffs.len()
                    );
                    None
                }
            },
            _ => {
                log::warn!(
                    "image {}: affine_coeffs and crs_epsg must be set together; transform dropped",
                    record.path
                );
                None
            }
        };

        Self {
            path: record.path.clone(),
            name: record.name.clone(),
            group: record.group.clone(),
            labels: record
                .labels
                .iter()
                .map(|label| PointLabel::from_record(label, width, height, version))
                .collect(),
            original_width: width,
            original_height: height,
            reader,
            transform,
        }
    }
}
