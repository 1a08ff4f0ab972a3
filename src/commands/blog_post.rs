use crate::commands::{invalid_paper_id, load_setup, paper_not_found, print_success};
use crate::deck::arxiv_id::ArxivId;
use crate::deck::atomic;
use crate::deck::index;
use crate::deck::papers;
use crate::error::{CliError, ErrorCode};
use clap::{ArgGroup, Args};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub const MIN_BLOG_POST_CHARS: usize = 100;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["content", "content_file"])))]
pub struct BlogPostArgs {
    /// arXiv paper ID (e.g., 2401.12345)
    #[arg(long)]
    pub paper_id: String,
    /// Blog post content as a string
    #[arg(long)]
    pub content: Option<String>,
    /// Path to a file containing the blog post content
    #[arg(long)]
    pub content_file: Option<PathBuf>,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BlogPostOutput {
    success: bool,
    paper_id: String,
    blog_path: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

/// A blog post requires an existing summary; the status flip follows the
/// same independently-failable metadata/index split as `mark-summary`.
pub fn run(args: BlogPostArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let Some(id) = ArxivId::parse(&args.paper_id) else {
        return Err(invalid_paper_id(&args.paper_id));
    };
    if !paths.paper_dir(&id).exists() {
        return Err(paper_not_found(&args.paper_id));
    }

    let record = papers::load(&paths, &id).ok_or_else(|| {
        CliError::with_details(
            ErrorCode::IoError,
            format!("Failed to load metadata for paper {id}"),
            "Check that metadata.json exists and is valid",
        )
    })?;
    if !record.has_summary || !paths.summary_file(&id).exists() {
        return Err(CliError::with_details(
            ErrorCode::NoSummary,
            format!("Paper {id} has no summary"),
            "Generate a summary first",
        ));
    }

    let content = match &args.content_file {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            CliError::with_details(
                ErrorCode::IoError,
                "Failed to read content file",
                err.to_string(),
            )
        })?,
        // The ArgGroup guarantees one of the two is set.
        None => args.content.clone().unwrap_or_default(),
    };
    if content.trim().chars().count() < MIN_BLOG_POST_CHARS {
        return Err(CliError::with_details(
            ErrorCode::InvalidContent,
            "Blog post content is too short",
            format!("Content must be at least {MIN_BLOG_POST_CHARS} characters"),
        ));
    }

    let blog_path = paths.blog_post_file(&id);
    atomic::write_text(&blog_path, &content)?;
    info!(paper = id.as_str(), path = %blog_path.display(), "saved blog post");

    let metadata_updated = papers::mark_blog_post(&paths, &id);
    let index_updated = index::update_entry(&paths, &id, |entry| entry.has_blog_post = true);

    let mut warnings: Vec<&str> = Vec::new();
    if !metadata_updated {
        warn!(paper = id.as_str(), "metadata update failed after blog post write");
        warnings.push("Metadata update failed");
    }
    if !index_updated {
        warn!(paper = id.as_str(), "index update failed after blog post write");
        warnings.push("Index update failed");
    }

    print_success(&BlogPostOutput {
        success: true,
        paper_id: args.paper_id,
        blog_path: blog_path.display().to_string(),
        message: "Blog post saved successfully".to_string(),
        warning: if warnings.is_empty() {
            None
        } else {
            Some(warnings.join("; "))
        },
    })
}
