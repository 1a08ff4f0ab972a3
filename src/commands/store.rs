use crate::commands::{load_setup, print_success};
use crate::deck::index;
use crate::deck::model::{IndexEntry, PaperRecord};
use crate::deck::papers;
use crate::deck::util::now_iso;
use crate::error::{CliError, ErrorCode};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Input JSON file produced by `fetch`
    #[arg(long)]
    pub input: PathBuf,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct StoreInput {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    query: String,
    #[serde(default)]
    papers: Vec<PaperRecord>,
}

#[derive(Debug, Serialize)]
struct StoreOutput {
    success: bool,
    saved: usize,
    duplicates: usize,
    total: usize,
}

pub fn run(args: StoreArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    if !args.input.exists() {
        return Err(CliError::new(
            ErrorCode::InputNotFound,
            format!("Input file not found: {}", args.input.display()),
        ));
    }

    let raw = fs::read_to_string(&args.input).map_err(|err| {
        CliError::with_details(
            ErrorCode::IoError,
            format!("Failed to read {}", args.input.display()),
            err.to_string(),
        )
    })?;
    let input: StoreInput = serde_json::from_str(&raw).map_err(|err| {
        CliError::with_details(
            ErrorCode::InvalidJson,
            format!("Invalid JSON in input file: {}", args.input.display()),
            err.to_string(),
        )
    })?;

    if !input.success {
        return Err(CliError::new(
            ErrorCode::InvalidArgument,
            "Input file records a failed fetch, nothing to store",
        ));
    }

    info!(papers = input.papers.len(), "processing papers from input");
    fs::create_dir_all(&paths.data_dir).map_err(|err| {
        CliError::with_details(
            ErrorCode::IoError,
            format!("Failed to create {}", paths.data_dir.display()),
            err.to_string(),
        )
    })?;

    // A corrupt index is replaced rather than blocking new papers.
    let mut index_record = index::load_or_default(&paths);

    let mut saved = 0usize;
    let mut duplicates = 0usize;
    for paper in &input.papers {
        let record = PaperRecord {
            collected_at: now_iso(),
            topics: if input.query.is_empty() {
                Vec::new()
            } else {
                vec![input.query.clone()]
            },
            has_summary: false,
            ..paper.clone()
        };

        match papers::create(&paths, &record) {
            Ok(true) => saved += 1,
            Ok(false) => duplicates += 1,
            Err(err) => {
                warn!(paper = record.id.as_str(), "failed to save paper: {err:#}");
                continue;
            }
        }

        if crate::deck::arxiv_id::is_valid(&record.id)
            && !index_record.papers.contains_key(&record.id)
        {
            index_record
                .papers
                .insert(record.id.clone(), IndexEntry::from_record(&record));
        }
    }

    index::save(&paths, &mut index_record).map_err(|err| {
        CliError::with_details(ErrorCode::IoError, "Failed to update index", format!("{err:#}"))
    })?;

    info!(saved, duplicates, "store complete");
    print_success(&StoreOutput {
        success: true,
        saved,
        duplicates,
        total: input.papers.len(),
    })
}
