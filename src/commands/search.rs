use crate::commands::{load_setup, print_success};
use crate::deck::search::{self, SearchError, SearchHit};
use crate::error::{CliError, ErrorCode};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search query (1-500 characters)
    #[arg(long)]
    pub query: String,
    /// Maximum results to return
    #[arg(long, default_value_t = search::DEFAULT_LIMIT)]
    pub limit: usize,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    success: bool,
    query: String,
    total_papers: usize,
    match_count: usize,
    results: Vec<SearchHit>,
}

pub fn run(args: SearchArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let outcome = search::search(&paths, &args.query, args.limit).map_err(|err| match err {
        SearchError::InvalidQuery(message) => {
            CliError::with_details(ErrorCode::InvalidQuery, message.clone(), message)
        }
        SearchError::Index(inner) => inner.into(),
    })?;

    print_success(&SearchOutput {
        success: true,
        query: args.query,
        total_papers: outcome.total_papers,
        match_count: outcome.results.len(),
        results: outcome.results,
    })
}
