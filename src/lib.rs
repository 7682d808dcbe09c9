//! Geolabel: point labels on georeferenced rasters.
//!
//! Geolabel models a labelling project over a set of GeoTIFF-like images:
//! each image owns point labels with a pixel position and a WGS84 position,
//! and labels on different images can be linked as the same real-world
//! object. Projects persist as versioned `.geolabel` JSON documents.
//!
//! # Modules
//!
//! - [`model`]: project, images, labels, and the `.geolabel` format
//! - [`geo`]: affine transforms, reprojection, and geodesic distance
//! - [`readers`]: reader identifiers and ground control points
//! - [`loader`]: events from the background image loader
//! - [`validation`]: project validation and error reporting
//! - [`inspect`]: project summary reports
//! - [`error`]: Error types for geolabel operations

pub mod error;
pub mod geo;
pub mod inspect;
pub mod loader;
pub mod model;
pub mod readers;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::GeolabelError;
pub use model::LabelProject;

/// The geolabel CLI application.
#[derive(Parser)]
#[command(name = "geolabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Summarize a project: images, classes, labels, and links.
    Info(InfoArgs),
    /// Validate a project for errors and warnings.
    Validate(ValidateArgs),
    /// Rewrite a project in the current schema version.
    Migrate(MigrateArgs),
    /// List the labels linked to a label.
    Links(LinksArgs),
}

#[derive(clap::Args)]
struct InfoArgs {
    /// Project file to inspect.
    project: PathBuf,

    /// Number of classes to show in the histogram.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Project file to validate.
    project: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long, env = "GEOLABEL_STRICT")]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text", env = "GEOLABEL_OUTPUT")]
    output: String,
}

#[derive(clap::Args)]
struct MigrateArgs {
    /// Project file in any supported schema version.
    input: PathBuf,

    /// Where to write the current-version project.
    output: PathBuf,
}

#[derive(clap::Args)]
struct LinksArgs {
    /// Project file.
    project: PathBuf,

    /// Numeric id of the label.
    label_id: u64,
}

/// Run the geolabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), GeolabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Info(args)) => run_info(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Migrate(args)) => run_migrate(args),
        Some(Commands::Links(args)) => run_links(args),
        None => {
            println!("geolabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Point labels on georeferenced rasters.");
            println!();
            println!("Run 'geolabel --help' for usage information.");
            Ok(())
        }
    }
}

fn run_info(args: InfoArgs) -> Result<(), GeolabelError> {
    let project = LabelProject::load(&args.project)?;
    let opts = inspect::InspectOptions {
        top_classes: args.top,
        ..Default::default()
    };
    print!("{}", inspect::inspect_project(&project, &opts));
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), GeolabelError> {
    if !matches!(args.output.as_str(), "text" | "json") {
        return Err(GeolabelError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            args.output
        )));
    }

    let project = LabelProject::load(&args.project)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
        ..Default::default()
    };
    let report = validation::validate_project(&project, &opts);

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report.to_json()).map_err(|source| {
                GeolabelError::ProjectWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{json}");
        }
        _ => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (opts.strict && has_warnings) {
        Err(GeolabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

fn run_migrate(args: MigrateArgs) -> Result<(), GeolabelError> {
    let project = LabelProject::load(&args.input)?;
    project.save(&args.output)?;
    println!(
        "Migrated {} -> {} (schema {}, {} images, {} labels)",
        args.input.display(),
        args.output.display(),
        model::SchemaVersion::CURRENT,
        project.image_count(),
        project.label_count()
    );
    Ok(())
}

fn run_links(args: LinksArgs) -> Result<(), GeolabelError> {
    let project = LabelProject::load(&args.project)?;
    let label_id = model::LabelId::new(args.label_id);

    if project.label_by_id(label_id).is_none() {
        println!("label {} not found", label_id);
        return Ok(());
    }

    let linked = project.linked_labels(label_id);
    if linked.is_empty() {
        println!("label {} is not linked", label_id);
        return Ok(());
    }

    let (_, label) = linked[0];
    println!(
        "label {} belongs to object {} ({} labels):",
        label_id,
        label.object_id(),
        linked.len()
    );
    for (image, label) in linked {
        println!(
            "  {}\t{}\t{}",
            image.path(),
            label.id(),
            label.class_name()
        );
    }
    Ok(())
}
