pub mod annotate;
pub mod annotations;
pub mod blog_post;
pub mod digest;
pub mod export;
pub mod fetch;
pub mod fetch_citations;
pub mod graph;
pub mod import;
pub mod mark_summary;
pub mod search;
pub mod share;
pub mod store;

use crate::deck::config::{self, DeckConfig};
use crate::deck::paths::DeckPaths;
use crate::error::{CliError, ErrorCode};
use serde::Serialize;
use std::path::PathBuf;

/// Pretty-print a success object to stdout. Stdout carries nothing else.
pub fn print_success<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(|err| {
        CliError::with_details(ErrorCode::UnknownError, "failed to render output", err.to_string())
    })?;
    println!("{rendered}");
    Ok(())
}

/// Load config and resolve the data directory: the `--data-dir` flag wins
/// over config and `PAPERDECK_DATA_DIR`.
pub fn load_setup(data_dir: Option<PathBuf>) -> Result<(DeckConfig, DeckPaths), CliError> {
    let cfg = config::load_config().map_err(|err| {
        CliError::with_details(ErrorCode::InvalidArgument, "invalid configuration", format!("{err:#}"))
    })?;
    let dir = data_dir.unwrap_or_else(|| PathBuf::from(&cfg.data_dir));
    Ok((cfg, DeckPaths::new(dir)))
}

/// `INVALID_PAPER_ID` with the guidance every ID-taking command emits.
pub fn invalid_paper_id(raw: &str) -> CliError {
    CliError::with_details(
        ErrorCode::InvalidPaperId,
        format!("Invalid arXiv ID format: {raw}"),
        "arXiv ID must be in format YYMM.NNNNN (e.g., 2401.12345)",
    )
}

/// `PAPER_NOT_FOUND` for a paper missing from the collection on disk.
pub fn paper_not_found(raw: &str) -> CliError {
    CliError::with_details(
        ErrorCode::PaperNotFound,
        format!("Paper {raw} not found in collection"),
        "Ensure the paper exists in your collection",
    )
}
