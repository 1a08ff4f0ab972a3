use crate::commands::{load_setup, print_success};
use crate::deck::atomic;
use crate::deck::digest;
use crate::deck::index;
use crate::error::{CliError, ErrorCode};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct DigestArgs {
    /// Lookback window (24h, 7d, 2w, 1m)
    #[arg(long, default_value = digest::DEFAULT_TIMESPAN)]
    pub since: String,
    /// Output file path (defaults to <data-dir>/digests/<date>.md)
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DigestOutput {
    success: bool,
    message: String,
    papers_count: usize,
    topics_count: usize,
    output_path: Option<String>,
}

pub fn run(args: DigestArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let window = digest::parse_timespan(&args.since)
        .map_err(|message| CliError::new(ErrorCode::InvalidArgument, message))?;

    let index_record = index::load(&paths)?;
    if index_record.papers.is_empty() {
        return print_success(&DigestOutput {
            success: true,
            message: "No papers in collection. Run /paper-collect first.".to_string(),
            papers_count: 0,
            topics_count: 0,
            output_path: None,
        });
    }

    let until = Utc::now();
    let since = until - window;
    let in_range = digest::filter_by_date(&index_record, since, until);
    if in_range.is_empty() {
        return print_success(&DigestOutput {
            success: true,
            message: format!("No papers collected in the last {}.", args.since),
            papers_count: 0,
            topics_count: 0,
            output_path: None,
        });
    }

    let grouped = digest::group_by_topic(&in_range, &paths);
    let rendered = digest::render(&grouped, since, until, &paths);

    let output_path = args.output.unwrap_or_else(|| {
        paths
            .data_dir
            .join("digests")
            .join(format!("{}.md", until.format("%Y-%m-%d")))
    });
    atomic::write_text(&output_path, &rendered)?;
    info!(
        papers = in_range.len(),
        topics = grouped.len(),
        path = %output_path.display(),
        "digest written"
    );

    print_success(&DigestOutput {
        success: true,
        message: format!("Digest generated with {} papers.", in_range.len()),
        papers_count: in_range.len(),
        topics_count: grouped.len(),
        output_path: Some(output_path.display().to_string()),
    })
}
