//! Reading and writing `.geolabel` project files.
//!
//! Any supported schema version is read; the current version is always
//! written. Loading is best-effort for recoverable damage (see the `warn`
//! logs in [`ImageData::from_record`] and [`PointLabel::from_record`]) and
//! strict for damage that would break label identity: duplicate label ids
//! reject the whole file.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use super::coord::Coord;
use super::image::{ImageData, ImageSpec};
use super::label::PointLabel;
use super::project::LabelProject;
#[cfg(feature = "fuzzing")]
use super::schema::LabelRecord;
use super::schema::{LegacyProjectRecord, ProjectRecord, SchemaVersion};
use crate::error::GeolabelError;
use crate::geo::LatLon;
use crate::readers::{display_name_of, DEFAULT_READER};

/// Path reported in errors for in-memory documents.
const STRING_SOURCE: &str = "<string>";

/// Reads a project file of any supported schema version.
///
/// # Errors
/// Returns an error if the file cannot be read, is not JSON, has an
/// unreadable or too-new version, or violates label id uniqueness.
pub fn read_project(path: &Path) -> Result<LabelProject, GeolabelError> {
    let file = File::open(path).map_err(GeolabelError::Io)?;
    let reader = BufReader::new(file);

    let document: Value =
        serde_json::from_reader(reader).map_err(|source| GeolabelError::ProjectParse {
            path: path.to_path_buf(),
            source,
        })?;

    let project = project_from_value(document, path)?;
    log::info!(
        "loaded {} ({} images, {} labels)",
        path.display(),
        project.image_count(),
        project.label_count()
    );
    Ok(project)
}

/// Writes a project file in the current schema version.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_project(path: &Path, project: &LabelProject) -> Result<(), GeolabelError> {
    let file = File::create(path).map_err(GeolabelError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, &to_record(project)).map_err(|source| {
        GeolabelError::ProjectWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(GeolabelError::Io)?;

    log::info!(
        "saved {} ({} images, {} labels)",
        path.display(),
        project.image_count(),
        project.label_count()
    );
    Ok(())
}

/// Reads a project from a JSON string.
pub fn from_project_str(json: &str) -> Result<LabelProject, GeolabelError> {
    let document: Value =
        serde_json::from_str(json).map_err(|source| GeolabelError::ProjectParse {
            path: STRING_SOURCE.into(),
            source,
        })?;
    project_from_value(document, Path::new(STRING_SOURCE))
}

/// Reads a project from JSON bytes.
pub fn from_project_slice(bytes: &[u8]) -> Result<LabelProject, GeolabelError> {
    let document: Value =
        serde_json::from_slice(bytes).map_err(|source| GeolabelError::ProjectParse {
            path: STRING_SOURCE.into(),
            source,
        })?;
    project_from_value(document, Path::new(STRING_SOURCE))
}

/// Fuzz-only entrypoint for a single image-centric label object.
///
/// Decodes the record, rebuilds the label against a 100x100 image and
/// writes it back out.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_record(input: &str) -> Result<(), GeolabelError> {
    let path = Path::new("<fuzz>");
    let record: LabelRecord =
        serde_json::from_str(input).map_err(|source| GeolabelError::ProjectParse {
            path: path.to_path_buf(),
            source,
        })?;
    let label = PointLabel::from_record(&record, 100, 100, SchemaVersion::CURRENT);
    let _ = label.to_record(100, 100);
    Ok(())
}

/// Writes a project to a pretty-printed JSON string.
pub fn to_project_string(project: &LabelProject) -> Result<String, GeolabelError> {
    serde_json::to_string_pretty(&to_record(project)).map_err(|source| {
        GeolabelError::ProjectWrite {
            path: STRING_SOURCE.into(),
            source,
        }
    })
}

impl LabelProject {
    /// Loads a project file. See [`read_project`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeolabelError> {
        read_project(path.as_ref())
    }

    /// Saves the project in the current schema version. See [`write_project`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GeolabelError> {
        write_project(path.as_ref(), self)
    }
}

fn to_record(project: &LabelProject) -> ProjectRecord {
    ProjectRecord {
        version: SchemaVersion::CURRENT.to_string(),
        classes: project.classes().to_vec(),
        images: project.images().map(ImageData::to_record).collect(),
        next_id: project.next_id().as_u64(),
        custom_readers: Default::default(),
    }
}

/// Schema version a document declares; `1.0` when it declares none.
pub fn document_version(document: &Value, path: &Path) -> Result<SchemaVersion, GeolabelError> {
    let invalid = |message: String| GeolabelError::ProjectInvalid {
        path: path.to_path_buf(),
        message,
    };

    let raw = match document.get("version") {
        None | Some(Value::Null) => return Ok(SchemaVersion::LEGACY),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(invalid(format!("version must be a string, found {other}"))),
    };

    raw.parse::<SchemaVersion>()
        .map_err(|err| invalid(err.to_string()))
}

fn project_from_value(document: Value, path: &Path) -> Result<LabelProject, GeolabelError> {
    if !document.is_object() {
        return Err(GeolabelError::ProjectInvalid {
            path: path.to_path_buf(),
            message: "top-level value must be an object".into(),
        });
    }

    let version = document_version(&document, path)?;
    if !version.is_supported() {
        return Err(GeolabelError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: version.to_string(),
        });
    }
    log::debug!("reading {} as schema {version}", path.display());

    if version.is_image_centric() {
        parse_image_centric(document, version, path)
    } else {
        parse_label_centric(document, path)
    }
}

/// Image-centric layout (>= 2.0).
fn parse_image_centric(
    document: Value,
    version: SchemaVersion,
    path: &Path,
) -> Result<LabelProject, GeolabelError> {
    let record: ProjectRecord =
        serde_json::from_value(document).map_err(|err| GeolabelError::ProjectInvalid {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let images: Vec<ImageData> = record
        .images
        .iter()
        .map(|image| ImageData::from_record(image, version))
        .collect();
    ensure_unique_label_ids(&images, path)?;

    // Per-image readers win over the legacy project-wide table.
    let mut readers: Vec<(String, String)> = Vec::new();
    for image in &images {
        for (ext, reader) in image.reader() {
            if reader != DEFAULT_READER && !readers.iter().any(|(known, _)| known == ext) {
                readers.push((ext.clone(), reader.clone()));
            }
        }
    }
    for (ext, reader) in record.custom_readers {
        if !readers.iter().any(|(known, _)| *known == ext) {
            readers.push((ext, reader));
        }
    }

    Ok(LabelProject::from_parts(
        record.classes,
        images,
        readers,
        record.next_id,
    ))
}

/// Label-centric layout (< 2.0).
///
/// These documents carry no identifiers, so every label loads as its own
/// object with fresh ids. Pixel positions are absolute.
fn parse_label_centric(document: Value, path: &Path) -> Result<LabelProject, GeolabelError> {
    let record: LegacyProjectRecord =
        serde_json::from_value(document).map_err(|err| GeolabelError::ProjectInvalid {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let mut images: Vec<ImageData> = Vec::new();
    let image_slot = |images: &mut Vec<ImageData>, path: &str, name: &str, group: &str| {
        match images.iter().position(|image| image.path == path) {
            Some(slot) => slot,
            None => {
                let name = if name.is_empty() {
                    display_name_of(path)
                } else {
                    name.to_string()
                };
                images.push(ImageData::from_spec(
                    ImageSpec::new(path, name).with_group(group),
                ));
                images.len() - 1
            }
        }
    };

    for label in &record.labels {
        if label.image_path.is_empty() {
            log::warn!("label {}: no image_path, skipped", label.id);
            continue;
        }
        let slot = image_slot(
            &mut images,
            &label.image_path,
            &label.image_name,
            &label.image_group,
        );
        let (pixel_x, pixel_y) = label.pixel();
        images[slot].labels.push(PointLabel::new(
            label.id,
            label.class_name.clone(),
            Coord::new(pixel_x, pixel_y),
            LatLon::new(label.lat, label.lon),
        ));
    }
    for image_path in record.image_paths.iter().filter(|p| !p.is_empty()) {
        image_slot(&mut images, image_path, "", "");
    }

    ensure_unique_label_ids(&images, path)?;
    Ok(LabelProject::from_parts(
        record.classes,
        images,
        Vec::new(),
        record.next_id,
    ))
}

fn ensure_unique_label_ids(images: &[ImageData], path: &Path) -> Result<(), GeolabelError> {
    let mut seen = HashSet::new();
    for image in images {
        for label in image.labels() {
            if !seen.insert(label.id()) {
                return Err(GeolabelError::ProjectInvalid {
                    path: path.to_path_buf(),
                    message: format!("label id {} appears more than once", label.id()),
                });
            }
        }
    }
    Ok(())
}
