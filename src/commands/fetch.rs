use crate::commands::{load_setup, print_success};
use crate::deck::atomic;
use crate::error::{CliError, ErrorCode};
use crate::remote::arxiv::{ArxivClient, FetchedPaper};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Search topic/keywords
    #[arg(long)]
    pub query: String,
    /// Number of days to look back
    #[arg(long, default_value_t = 7)]
    pub days: u32,
    /// Maximum papers to fetch
    #[arg(long, default_value_t = 50)]
    pub max: u64,
    /// Write the result JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FetchOutput {
    success: bool,
    count: usize,
    query: String,
    days: u32,
    papers: Vec<FetchedPaper>,
}

pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let (cfg, _) = load_setup(None)?;

    if args.days == 0 || args.max == 0 {
        return Err(CliError::new(
            ErrorCode::InvalidArgument,
            "--days and --max must be positive",
        ));
    }

    let client = ArxivClient::new(cfg.arxiv, cfg.http_timeout_secs)?;
    info!(query = args.query.as_str(), days = args.days, "searching arXiv");

    let papers = client.fetch(&args.query, args.days, args.max).map_err(|err| {
        CliError::with_details(
            ErrorCode::FetchFailed,
            "Failed to fetch papers from arXiv",
            format!("{err:#}"),
        )
    })?;
    info!(papers = papers.len(), "fetch complete");

    let output = FetchOutput {
        success: true,
        count: papers.len(),
        query: args.query,
        days: args.days,
        papers,
    };

    match &args.output {
        Some(path) => {
            let rendered = serde_json::to_string_pretty(&output).map_err(|err| {
                CliError::with_details(
                    ErrorCode::UnknownError,
                    "failed to render output",
                    err.to_string(),
                )
            })?;
            atomic::write_text(path, &rendered)?;
            info!(path = %path.display(), "wrote fetch output");
            Ok(())
        }
        None => print_success(&output),
    }
}
