use crate::commands::{load_setup, print_success};
use crate::deck::graph;
use crate::error::{CliError, ErrorCode};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// How many highly-cited papers to report
    #[arg(long, default_value_t = graph::DEFAULT_TOP_N)]
    pub top: usize,
    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct HighlyCited {
    id: String,
    cited_by_count: usize,
}

#[derive(Debug, Serialize)]
struct GraphOutput {
    success: bool,
    total_papers: usize,
    papers_with_citations: usize,
    total_edges: usize,
    highly_cited: Vec<HighlyCited>,
}

pub fn run(args: GraphArgs) -> Result<(), CliError> {
    let (_, paths) = load_setup(args.data_dir)?;

    if !paths.exists() {
        return Err(CliError::new(
            ErrorCode::DataDirNotFound,
            format!("Data directory not found: {}", paths.data_dir.display()),
        ));
    }

    let citation_graph = graph::build(&paths)?;
    if citation_graph.is_empty() {
        info!("no papers with citation data");
        return print_success(&GraphOutput {
            success: true,
            total_papers: 0,
            papers_with_citations: 0,
            total_edges: 0,
            highly_cited: Vec::new(),
        });
    }

    let stats = graph::stats(&citation_graph);
    let highly_cited = graph::highly_cited(&citation_graph, args.top);
    graph::save(&paths, &citation_graph, stats, &highly_cited)?;

    info!(
        papers = stats.total_papers,
        with_citations = stats.papers_with_citations,
        edges = stats.total_edges,
        "graph built"
    );

    print_success(&GraphOutput {
        success: true,
        total_papers: stats.total_papers,
        papers_with_citations: stats.papers_with_citations,
        total_edges: stats.total_edges,
        highly_cited: highly_cited
            .into_iter()
            .map(|(id, cited_by_count)| HighlyCited { id, cited_by_count })
            .collect(),
    })
}
