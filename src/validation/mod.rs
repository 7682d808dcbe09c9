//! Project validation for geolabel.
//!
//! This module checks a loaded project for:
//! - Structural integrity (index consistency, id counter ahead of every id)
//! - Data quality (declared, non-empty classes; image dimensions)
//! - Geometric validity (finite pixels inside the image, valid WGS84
//!   positions that agree with the image transform)

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::HashSet;

use crate::geo::haversine_distance;
use crate::model::{ImageData, LabelProject, PointLabel};

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
    /// Slack in pixels before a label counts as outside its image.
    pub bounds_tolerance_px: f64,
    /// Distance in metres a label's stored position may drift from the
    /// transform of its pixel position.
    pub geo_tolerance_m: f64,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            bounds_tolerance_px: 0.5,
            geo_tolerance_m: 1.0,
        }
    }
}

/// Validates a project and returns a report of all issues found.
pub fn validate_project(project: &LabelProject, opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_indexes(project, &mut report);
    validate_classes(project, &mut report);

    let declared: HashSet<&str> = project.classes().iter().map(String::as_str).collect();
    for image in project.images() {
        validate_image(image, &mut report);
        for label in image.labels() {
            validate_label(image, label, &declared, opts, &mut report);
        }
    }

    report
}

fn validate_indexes(project: &LabelProject, report: &mut ValidationReport) {
    for drift in project.index_drift() {
        report.add(ValidationIssue::error(
            IssueCode::IndexDrift,
            drift,
            IssueContext::Project,
        ));
    }

    let next_id = project.next_id();
    if let Some(highest) = project.all_labels().map(|(_, l)| l.id()).max() {
        if next_id <= highest {
            report.add(ValidationIssue::error(
                IssueCode::NextIdBehind,
                format!("next id {} is not above label id {}", next_id, highest),
                IssueContext::Project,
            ));
        }
    }
}

fn validate_classes(project: &LabelProject, report: &mut ValidationReport) {
    for name in project.classes() {
        if name.trim().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyClassName,
                "Empty class name",
                IssueContext::Class { name: name.clone() },
            ));
        }
    }
}

fn validate_image(image: &ImageData, report: &mut ValidationReport) {
    if image.original_width() == 0 || image.original_height() == 0 {
        report.add(ValidationIssue::warning(
            IssueCode::MissingDimensions,
            format!(
                "Dimensions {}x{} unknown; label positions are stored as absolute pixels",
                image.original_width(),
                image.original_height()
            ),
            IssueContext::Image {
                path: image.path().to_string(),
            },
        ));
    }
}

fn validate_label(
    image: &ImageData,
    label: &PointLabel,
    declared: &HashSet<&str>,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let context = || IssueContext::Label {
        id: label.id().as_u64(),
    };

    if !declared.contains(label.class_name()) {
        report.add(ValidationIssue::warning(
            IssueCode::UndeclaredClass,
            format!("Class '{}' is not declared", label.class_name()),
            context(),
        ));
    }

    let pixel = label.pixel();
    if !pixel.is_finite() {
        report.add(ValidationIssue::error(
            IssueCode::LabelNotFinite,
            format!("Pixel position ({}, {}) is not finite", pixel.x, pixel.y),
            context(),
        ));
        return;
    }

    if !label.position().is_valid() {
        report.add(ValidationIssue::error(
            IssueCode::InvalidLatLon,
            format!(
                "Position lat {} lon {} is outside the WGS84 range",
                label.lat(),
                label.lon()
            ),
            context(),
        ));
    }

    let (width, height) = (image.original_width(), image.original_height());
    if width > 0 && height > 0 {
        let tol = opts.bounds_tolerance_px;
        let outside = pixel.x < -tol
            || pixel.y < -tol
            || pixel.x > f64::from(width) + tol
            || pixel.y > f64::from(height) + tol;
        if outside {
            report.add(ValidationIssue::warning(
                IssueCode::LabelOutOfBounds,
                format!(
                    "Pixel ({:.1}, {:.1}) lies outside the {}x{} image {}",
                    pixel.x,
                    pixel.y,
                    width,
                    height,
                    image.path()
                ),
                context(),
            ));
        }
    }

    if label.position().is_valid() {
        if let Some(expected) = image.pixel_to_latlon(pixel.x, pixel.y) {
            let distance = haversine_distance(expected, label.position());
            if distance > opts.geo_tolerance_m {
                report.add(ValidationIssue::warning(
                    IssueCode::GeoMismatch,
                    format!(
                        "Stored position is {:.1} m from the transformed pixel position",
                        distance
                    ),
                    context(),
                ));
            }
        }
    }
}
