use crate::commands::{invalid_paper_id, load_setup, paper_not_found, print_success};
use crate::deck::annotations::{self, AnnotateError};
use crate::deck::arxiv_id::ArxivId;
use crate::deck::model::AnnotationType;
use crate::error::{CliError, ErrorCode};
use clap::{ArgGroup, Args};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["content", "content_file"])))]
pub struct AnnotateArgs {
    /// arXiv paper ID (e.g., 2401.12345)
    #[arg(long)]
    pub paper_id: String,
    /// Annotation content as a string
    #[arg(long)]
    pub content: Option<String>,
    /// Path to a file containing the annotation content
    #[arg(long)]
    pub content_file: Option<PathBuf>,
    /// Author name (defaults to $USER)
    #[arg(long)]
    pub author: Option<String>,
    /// Annotation type: note, highlight, question, comment
    #[arg(long, default_value = "note")]
    pub kind: AnnotationType,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnnotateOutput {
    success: bool,
    message: String,
    annotation_id: String,
    paper_id: String,
    author: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

pub fn run(args: AnnotateArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let Some(id) = ArxivId::parse(&args.paper_id) else {
        return Err(invalid_paper_id(&args.paper_id));
    };

    let content = match &args.content_file {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::with_details(
                    ErrorCode::InputNotFound,
                    format!("Content file not found: {}", path.display()),
                    "Provide a valid file path with --content-file",
                ));
            }
            fs::read_to_string(path).map_err(|err| {
                CliError::with_details(
                    ErrorCode::IoError,
                    "Failed to read content file",
                    err.to_string(),
                )
            })?
        }
        None => args.content.clone().unwrap_or_default(),
    };

    let author = args
        .author
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "anonymous".to_string());

    let annotation =
        annotations::save(&paths, &id, &content, &author, args.kind).map_err(|err| match err {
            AnnotateError::PaperNotFound(_) => paper_not_found(&args.paper_id),
            AnnotateError::InvalidContent(message) => {
                CliError::new(ErrorCode::InvalidContent, message)
            }
            AnnotateError::Io(inner) => CliError::with_details(
                ErrorCode::IoError,
                "Failed to save annotation",
                format!("{inner:#}"),
            ),
        })?;

    print_success(&AnnotateOutput {
        success: true,
        message: format!("Saved annotation for paper {id}."),
        annotation_id: annotation.id,
        paper_id: annotation.paper_id,
        author: annotation.author,
        kind: args.kind.as_str(),
    })
}
