use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for geolabel operations.
#[derive(Debug, Error)]
pub enum GeolabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse project JSON from {path}: {source}")]
    ProjectParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write project JSON to {path}: {source}")]
    ProjectWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid project file {path}: {message}")]
    ProjectInvalid { path: PathBuf, message: String },

    #[error("Project {path} uses schema version {version}, which is newer than this build supports")]
    UnsupportedVersion { path: PathBuf, version: String },

    #[error("At least 3 ground control points are required, got {count}")]
    InsufficientGcps { count: usize },

    #[error("Ground control points are collinear; cannot fit an affine transform")]
    DegenerateGcps,

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
