use crate::commands::{load_setup, print_success};
use crate::deck::package::{self, ImportError};
use crate::error::{CliError, ErrorCode};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to a collection package ZIP file
    #[arg(long)]
    pub input: PathBuf,
    /// Replace papers that are already in the collection
    #[arg(long)]
    pub overwrite: bool,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ImportOutput {
    success: bool,
    message: String,
    imported_count: usize,
    skipped_count: usize,
    annotation_count: usize,
    imported_ids: Vec<String>,
}

pub fn run(args: ImportArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let outcome = package::import(&paths, &args.input, args.overwrite).map_err(|err| match err {
        ImportError::NotFound(path) => CliError::with_details(
            ErrorCode::InputNotFound,
            "Package file not found",
            path.display().to_string(),
        ),
        ImportError::BadZip(details) => CliError::with_details(
            ErrorCode::InvalidZip,
            "File is not a valid ZIP archive",
            details,
        ),
        ImportError::BadPackage(details) => CliError::with_details(
            ErrorCode::InvalidPackage,
            "Invalid or corrupted package",
            details,
        ),
        ImportError::Io(inner) => CliError::with_details(
            ErrorCode::IoError,
            "Failed to import package",
            format!("{inner:#}"),
        ),
    })?;

    info!(
        imported = outcome.imported,
        skipped = outcome.skipped,
        "import complete"
    );
    print_success(&ImportOutput {
        success: true,
        message: format!(
            "Imported {} papers ({} skipped, {} annotations).",
            outcome.imported, outcome.skipped, outcome.annotations
        ),
        imported_count: outcome.imported,
        skipped_count: outcome.skipped,
        annotation_count: outcome.annotations,
        imported_ids: outcome.imported_ids,
    })
}
