//! Events from the background image loader and how a project absorbs them.
//!
//! Reading rasters happens off the model, on a worker that reports one event
//! per file and a final count. The project only needs what a reader
//! resolved: dimensions, which reader was used, and a georeference.

use std::fmt;

use crate::geo::{Affine, Epsg};
use crate::model::{ImageSpec, LabelProject};
use crate::readers::{display_name_of, GroundControlPoint, ReaderSpec};

/// How a loaded image is tied to the ground.
#[derive(Clone, Debug, PartialEq)]
pub enum Georeference {
    /// A native geotransform in a projected CRS.
    Affine { affine: Affine, epsg: Epsg },
    /// Ground control points reported by a custom reader.
    Gcps(Vec<GroundControlPoint>),
}

/// Metadata the loader resolved for one file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedImage {
    /// Display name; the file stem is used when empty.
    pub name: String,
    pub group: String,
    pub width: u32,
    pub height: u32,
    /// `(extension, reader identifier)` of the reader that read the file.
    pub reader: Option<(String, ReaderSpec)>,
    pub georeference: Option<Georeference>,
}

/// One message from the loader.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadEvent {
    Loaded { path: String, image: LoadedImage },
    Failed { path: String, message: String },
    BatchComplete { count: usize },
}

/// What the project did with a [`LoadEvent`].
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// The image is registered.
    ///
    /// `georeference_error` is set when GCPs were supplied but no transform
    /// could be fitted; the image is then registered without one.
    Registered {
        path: String,
        georeferenced: bool,
        georeference_error: Option<String>,
    },
    Failed {
        path: String,
        message: String,
    },
    BatchComplete {
        count: usize,
    },
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOutcome::Registered {
                path,
                georeferenced,
                georeference_error,
            } => {
                write!(f, "loaded {path}")?;
                if let Some(err) = georeference_error {
                    write!(f, " (not georeferenced: {err})")
                } else if !georeferenced {
                    write!(f, " (not georeferenced)")
                } else {
                    Ok(())
                }
            }
            LoadOutcome::Failed { path, message } => write!(f, "failed to load {path}: {message}"),
            LoadOutcome::BatchComplete { count } => write!(f, "finished loading {count} file(s)"),
        }
    }
}

impl LabelProject {
    /// Applies one loader event.
    ///
    /// Loaded images are registered (an already known path only gains a
    /// transform if it had none), GCPs are fitted to a Web Mercator affine,
    /// and a non-default reader is registered project-wide.
    pub fn apply_load_event(&mut self, event: LoadEvent) -> LoadOutcome {
        match event {
            LoadEvent::Loaded { path, image } => self.register_loaded(path, image),
            LoadEvent::Failed { path, message } => {
                log::warn!("failed to load {path}: {message}");
                LoadOutcome::Failed { path, message }
            }
            LoadEvent::BatchComplete { count } => {
                log::info!("loader finished {count} file(s)");
                LoadOutcome::BatchComplete { count }
            }
        }
    }

    fn register_loaded(&mut self, path: String, loaded: LoadedImage) -> LoadOutcome {
        let name = if loaded.name.is_empty() {
            display_name_of(&path)
        } else {
            loaded.name
        };
        let mut spec = ImageSpec::new(path.clone(), name)
            .with_group(loaded.group)
            .with_dimensions(loaded.width, loaded.height);

        if let Some((ext, reader)) = &loaded.reader {
            spec = spec.with_reader(ext.clone(), reader.identifier());
            if !reader.is_default() {
                self.register_custom_reader(ext.clone(), reader.identifier());
            }
        }

        let mut georeference_error = None;
        match loaded.georeference {
            Some(Georeference::Affine { affine, epsg }) => {
                spec = spec.with_transform(affine, epsg);
            }
            Some(Georeference::Gcps(gcps)) => match Affine::from_gcps(&gcps) {
                Ok((affine, epsg)) => spec = spec.with_transform(affine, epsg),
                Err(err) => {
                    log::warn!("{path}: {err}");
                    georeference_error = Some(err.to_string());
                }
            },
            None => {}
        }

        let georeferenced = self.add_image(spec).is_georeferenced();
        log::debug!("registered {path} (georeferenced: {georeferenced})");
        LoadOutcome::Registered {
            path,
            georeferenced,
            georeference_error,
        }
    }
}
