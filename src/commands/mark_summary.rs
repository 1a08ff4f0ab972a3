use crate::commands::{invalid_paper_id, load_setup, paper_not_found, print_success};
use crate::deck::arxiv_id::ArxivId;
use crate::deck::index;
use crate::deck::papers;
use crate::error::{CliError, ErrorCode};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Args)]
pub struct MarkSummaryArgs {
    /// arXiv paper ID (e.g., 2401.12345)
    #[arg(long)]
    pub paper_id: String,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct MarkSummaryOutput {
    success: bool,
    paper_id: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

/// Metadata and index are updated independently: an index failure after a
/// successful metadata write is reported as success with a warning, never
/// rolled back.
pub fn run(args: MarkSummaryArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let Some(id) = ArxivId::parse(&args.paper_id) else {
        return Err(invalid_paper_id(&args.paper_id));
    };
    if !paths.paper_dir(&id).exists() {
        return Err(paper_not_found(&args.paper_id));
    }

    let metadata_updated = papers::mark_summary(&paths, &id);
    let index_updated = index::update_entry(&paths, &id, |entry| entry.has_summary = true);

    if !metadata_updated {
        return Err(CliError::with_details(
            ErrorCode::UpdateFailed,
            "Failed to update summary status",
            format!("Metadata: {metadata_updated}, Index: {index_updated}"),
        ));
    }

    let (message, warning) = if index_updated {
        ("Updated summary status".to_string(), None)
    } else {
        warn!(paper = id.as_str(), "index update failed after metadata write");
        (
            "Updated metadata only (index update failed)".to_string(),
            Some("Index may be out of sync".to_string()),
        )
    };

    print_success(&MarkSummaryOutput {
        success: true,
        paper_id: args.paper_id,
        message,
        warning,
    })
}
