use crate::commands::{invalid_paper_id, load_setup, print_success};
use crate::deck::arxiv_id::ArxivId;
use crate::deck::digest;
use crate::deck::export::{self, Format, Selection};
use crate::deck::index;
use crate::error::{CliError, ErrorCode};
use chrono::Utc;
use clap::{ArgGroup, Args};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("selection").required(true).args(["paper_id", "all", "query"])))]
pub struct ExportArgs {
    /// Export format: markdown, json, csv
    #[arg(long, default_value = "markdown")]
    pub format: Format,
    /// Export a single paper by arXiv ID
    #[arg(long)]
    pub paper_id: Option<String>,
    /// Export every paper in the collection
    #[arg(long)]
    pub all: bool,
    /// Export papers matching a query
    #[arg(long)]
    pub query: Option<String>,
    /// Only papers collected within this window (24h, 7d, 2w, 1m)
    #[arg(long)]
    pub since: Option<String>,
    /// Inline summaries into the exported documents
    #[arg(long)]
    pub include_summary: bool,
    /// Output directory (defaults to <data-dir>/exports/<format>)
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    success: bool,
    message: String,
    export_count: usize,
    format: &'static str,
    output_path: Option<String>,
}

fn empty_success(message: String, format: Format) -> Result<(), CliError> {
    print_success(&ExportOutput {
        success: true,
        message,
        export_count: 0,
        format: format.as_str(),
        output_path: None,
    })
}

pub fn run(args: ExportArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let wanted_id = match &args.paper_id {
        Some(raw) => match ArxivId::parse(raw) {
            Some(id) => Some(id),
            None => return Err(invalid_paper_id(raw)),
        },
        None => None,
    };
    let since = match &args.since {
        Some(raw) => {
            let window = digest::parse_timespan(raw)
                .map_err(|message| CliError::new(ErrorCode::InvalidArgument, message))?;
            Some(Utc::now() - window)
        }
        None => None,
    };

    let index_record = index::load(&paths)?;
    if index_record.papers.is_empty() {
        return empty_success(
            "No papers in collection. Run /paper-collect first.".to_string(),
            args.format,
        );
    }

    let selection = Selection {
        paper_id: wanted_id,
        query: args.query.clone(),
        since,
    };
    let selected = export::filter(&index_record, &selection);
    if selected.is_empty() {
        let message = if let Some(raw) = &args.paper_id {
            format!("Paper {raw} not found in collection.")
        } else if let Some(query) = &args.query {
            format!("No papers match query '{query}'.")
        } else if let Some(raw) = &args.since {
            format!("No papers collected in the last {raw}.")
        } else {
            "No papers match the selection.".to_string()
        };
        return empty_success(message, args.format);
    }

    let output_dir = args
        .output
        .unwrap_or_else(|| paths.data_dir.join("exports").join(args.format.as_str()));
    let (count, written_to) = export::run(
        &paths,
        &selected,
        args.format,
        &output_dir,
        args.include_summary,
    )?;
    info!(
        papers = count,
        format = args.format.as_str(),
        path = %written_to.display(),
        "export complete"
    );

    print_success(&ExportOutput {
        success: true,
        message: format!(
            "Exported {count} papers as {}.",
            args.format.as_str().to_uppercase()
        ),
        export_count: count,
        format: args.format.as_str(),
        output_path: Some(written_to.display().to_string()),
    })
}
