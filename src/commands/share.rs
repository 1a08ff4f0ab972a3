use crate::commands::{invalid_paper_id, load_setup, print_success};
use crate::deck::arxiv_id::ArxivId;
use crate::deck::package::{self, ShareError, ShareRequest};
use crate::error::{CliError, ErrorCode};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Output path for the package ZIP file
    #[arg(long)]
    pub output: PathBuf,
    /// Package only these papers (repeatable; defaults to the whole collection)
    #[arg(long = "paper-id")]
    pub paper_ids: Vec<String>,
    /// Include generated summaries in the package
    #[arg(long)]
    pub include_summaries: bool,
    /// Include annotations in the package
    #[arg(long)]
    pub include_annotations: bool,
    /// Creator name recorded in the manifest (defaults to $USER)
    #[arg(long)]
    pub username: Option<String>,
    /// Free-text description recorded in the manifest
    #[arg(long)]
    pub description: Option<String>,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ShareOutput {
    success: bool,
    message: String,
    paper_count: usize,
    paper_ids: Vec<String>,
    output_path: String,
    includes_summaries: bool,
    includes_annotations: bool,
}

#[derive(Debug, Serialize)]
struct EmptyShareOutput {
    success: bool,
    message: String,
    paper_count: usize,
    output_path: Option<String>,
}

pub fn run(args: ShareArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let mut wanted: Vec<ArxivId> = Vec::with_capacity(args.paper_ids.len());
    for raw in &args.paper_ids {
        match ArxivId::parse(raw) {
            Some(id) => wanted.push(id),
            None => return Err(invalid_paper_id(raw)),
        }
    }

    let username = args
        .username
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "anonymous".to_string());

    let request = ShareRequest {
        paper_ids: &wanted,
        include_summaries: args.include_summaries,
        include_annotations: args.include_annotations,
        username: &username,
        description: args.description.as_deref(),
    };
    let shared = package::share(&paths, &request, &args.output).map_err(|err| match err {
        ShareError::PaperNotFound(id) => CliError::new(
            ErrorCode::PaperNotFound,
            format!("Paper not in collection: {id}"),
        ),
        ShareError::Index(inner) => inner.into(),
        ShareError::Io(inner) => CliError::with_details(
            ErrorCode::IoError,
            "Failed to create package",
            format!("{inner:#}"),
        ),
    })?;

    if shared.is_empty() {
        return print_success(&EmptyShareOutput {
            success: true,
            message: "No papers to share. Run /paper-collect first.".to_string(),
            paper_count: 0,
            output_path: None,
        });
    }

    info!(papers = shared.len(), output = %args.output.display(), "share complete");
    print_success(&ShareOutput {
        success: true,
        message: format!("Created collection package with {} papers.", shared.len()),
        paper_count: shared.len(),
        paper_ids: shared,
        output_path: args.output.display().to_string(),
        includes_summaries: args.include_summaries,
        includes_annotations: args.include_annotations,
    })
}
