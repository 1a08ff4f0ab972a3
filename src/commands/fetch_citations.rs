use crate::commands::{invalid_paper_id, load_setup, print_success};
use crate::deck::arxiv_id::{self, ArxivId};
use crate::deck::index;
use crate::deck::model::CitationData;
use crate::deck::papers;
use crate::deck::util::now_iso;
use crate::error::{CliError, ErrorCode};
use crate::remote::semantic_scholar::SemanticScholarClient;
use clap::{ArgGroup, Args};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["paper_id", "all"])))]
pub struct FetchCitationsArgs {
    /// arXiv paper ID to fetch citations for
    #[arg(long)]
    pub paper_id: Option<String>,
    /// Fetch citations for every paper in the collection
    #[arg(long)]
    pub all: bool,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FetchCitationsOutput {
    success: bool,
    papers_processed: usize,
    papers_with_citations: usize,
    papers_not_found: usize,
    errors: Vec<String>,
}

pub fn run(args: FetchCitationsArgs) -> Result<(), CliError> {
    let (cfg, paths) = load_setup(args.data_dir)?;

    if !paths.exists() {
        return Err(CliError::new(
            ErrorCode::DataDirNotFound,
            format!("Data directory not found: {}", paths.data_dir.display()),
        ));
    }

    // Tolerant index read: an empty or unreadable index is an empty
    // collection here, not a hard error.
    let index_record = index::load_or_default(&paths);
    if index_record.papers.is_empty() {
        warn!("no papers in collection");
        return print_success(&FetchCitationsOutput {
            success: true,
            papers_processed: 0,
            papers_with_citations: 0,
            papers_not_found: 0,
            errors: Vec::new(),
        });
    }

    let targets: Vec<String> = match &args.paper_id {
        Some(raw) => {
            if !arxiv_id::is_valid(raw) {
                return Err(invalid_paper_id(raw));
            }
            if !index_record.papers.contains_key(raw) {
                return Err(CliError::new(
                    ErrorCode::PaperNotFound,
                    format!("Paper not in collection: {raw}"),
                ));
            }
            vec![raw.clone()]
        }
        None => index_record.papers.keys().cloned().collect(),
    };

    let client = SemanticScholarClient::new(cfg.semantic_scholar, cfg.http_timeout_secs)?;
    info!(papers = targets.len(), "fetching citation data");

    let mut papers_processed = 0usize;
    let mut papers_with_citations = 0usize;
    let mut papers_not_found = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for raw in &targets {
        let Some(id) = ArxivId::parse(raw) else {
            warn!(paper = raw.as_str(), "skipping invalid paper ID");
            errors.push(format!("Invalid ID: {raw}"));
            continue;
        };

        let data = match client.fetch(&id) {
            Ok(Some(answer)) => {
                papers_with_citations += 1;
                CitationData::SemanticScholar {
                    fetched_at: now_iso(),
                    citation_count: answer.citation_count,
                    reference_count: answer.reference_count,
                    references_in_collection: in_collection(&answer.reference_ids, &index_record),
                    cited_by_in_collection: in_collection(&answer.citation_ids, &index_record),
                }
            }
            Ok(None) => {
                papers_not_found += 1;
                CitationData::Unavailable {
                    fetched_at: now_iso(),
                }
            }
            Err(err) => {
                error!(paper = id.as_str(), "citation fetch failed: {err:#}");
                errors.push(format!("Fetch failed: {id}"));
                continue;
            }
        };

        if papers::set_citation_data(&paths, &id, data) {
            papers_processed += 1;
        } else {
            errors.push(format!("Failed to update: {id}"));
        }
    }

    info!(
        papers_processed,
        papers_with_citations, papers_not_found, "citation fetch complete"
    );

    let failed = !errors.is_empty();
    let output = FetchCitationsOutput {
        success: !failed,
        papers_processed,
        papers_with_citations,
        papers_not_found,
        errors,
    };
    print_success(&output)?;

    // On partial failure the result object above is the whole report; exit
    // nonzero without a second envelope on stderr.
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn in_collection(ids: &[String], index_record: &crate::deck::model::IndexRecord) -> Vec<String> {
    ids.iter()
        .filter(|id| index_record.papers.contains_key(*id))
        .cloned()
        .collect()
}
