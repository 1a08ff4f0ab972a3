use crate::commands::{invalid_paper_id, load_setup, paper_not_found, print_success};
use crate::deck::annotations;
use crate::deck::arxiv_id::ArxivId;
use crate::deck::model::Annotation;
use crate::error::{CliError, ErrorCode};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Json,
    Markdown,
    Text,
}

impl FromStr for ListFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "text" => Ok(Self::Text),
            other => Err(format!(
                "invalid format '{other}' (use json, markdown, text)"
            )),
        }
    }
}

#[derive(Debug, Args)]
pub struct AnnotationsArgs {
    /// arXiv paper ID (e.g., 2401.12345)
    #[arg(long)]
    pub paper_id: String,
    /// Output format: json, markdown, text
    #[arg(long, default_value = "text")]
    pub format: ListFormat,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnnotationsOutput {
    success: bool,
    paper_id: String,
    count: usize,
    annotations: Vec<Annotation>,
}

fn render_markdown(paper_id: &str, listed: &[Annotation]) -> String {
    let mut lines: Vec<String> = vec![
        format!("# Annotations for Paper {paper_id}"),
        String::new(),
        format!("**Total annotations:** {}", listed.len()),
        String::new(),
        "---".to_string(),
        String::new(),
    ];
    for annotation in listed {
        lines.push(format!("### {}", annotation.kind.as_str()));
        lines.push(String::new());
        lines.push(format!("**Author:** {}  ", annotation.author));
        lines.push(format!("**Created:** {}", annotation.created_at));
        lines.push(String::new());
        lines.push(annotation.content.clone());
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

fn render_text(paper_id: &str, listed: &[Annotation]) -> String {
    let mut lines: Vec<String> = vec![
        format!("Annotations for Paper {paper_id}"),
        format!("Total: {}", listed.len()),
        "=".repeat(40),
        String::new(),
    ];
    for annotation in listed {
        lines.push(format!(
            "[{}] by {}",
            annotation.kind.as_str().to_uppercase(),
            annotation.author
        ));
        lines.push(format!("Created: {}", annotation.created_at));
        lines.push(String::new());
        lines.push(annotation.content.clone());
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn run(args: AnnotationsArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    let Some(id) = ArxivId::parse(&args.paper_id) else {
        return Err(invalid_paper_id(&args.paper_id));
    };
    if !paths.paper_dir(&id).exists() {
        return Err(paper_not_found(&args.paper_id));
    }

    let listed = annotations::list(&paths, &id).map_err(|err| {
        CliError::with_details(
            ErrorCode::IoError,
            "Failed to read annotations",
            format!("{err:#}"),
        )
    })?;

    match args.format {
        ListFormat::Json => print_success(&AnnotationsOutput {
            success: true,
            paper_id: args.paper_id,
            count: listed.len(),
            annotations: listed,
        }),
        ListFormat::Markdown => {
            println!("{}", render_markdown(&args.paper_id, &listed));
            Ok(())
        }
        ListFormat::Text => {
            if listed.is_empty() {
                println!("No annotations found for paper {}.", args.paper_id);
            } else {
                println!("{}", render_text(&args.paper_id, &listed));
            }
            Ok(())
        }
    }
}
