use crate::commands;
use crate::error::CliError;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "paperdeck",
    version,
    about = "Collect, search, and curate arXiv papers from the command line"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch recent papers from the arXiv API
    Fetch(commands::fetch::FetchArgs),
    /// Store fetched papers into the local collection
    Store(commands::store::StoreArgs),
    /// Search the collection with ranked keyword matching
    Search(commands::search::SearchArgs),
    /// Fetch citation data from Semantic Scholar
    FetchCitations(commands::fetch_citations::FetchCitationsArgs),
    /// Build the citation graph across the collection
    Graph(commands::graph::GraphArgs),
    /// Mark a paper as summarized
    MarkSummary(commands::mark_summary::MarkSummaryArgs),
    /// Attach a blog post to a summarized paper
    BlogPost(commands::blog_post::BlogPostArgs),
    /// Add an annotation to a paper
    Annotate(commands::annotate::AnnotateArgs),
    /// List a paper's annotations
    Annotations(commands::annotations::AnnotationsArgs),
    /// Generate a topic-grouped digest of recent papers
    Digest(commands::digest::DigestArgs),
    /// Export papers as markdown, JSON, or CSV
    Export(commands::export::ExportArgs),
    /// Package papers into a shareable ZIP archive
    Share(commands::share::ShareArgs),
    /// Import papers from a shared collection package
    Import(commands::import::ImportArgs),
}

pub fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Fetch(args) => commands::fetch::run(args),
        Command::Store(args) => commands::store::run(args),
        Command::Search(args) => commands::search::run(args),
        Command::FetchCitations(args) => commands::fetch_citations::run(args),
        Command::Graph(args) => commands::graph::run(args),
        Command::MarkSummary(args) => commands::mark_summary::run(args),
        Command::BlogPost(args) => commands::blog_post::run(args),
        Command::Annotate(args) => commands::annotate::run(args),
        Command::Annotations(args) => commands::annotations::run(args),
        Command::Digest(args) => commands::digest::run(args),
        Command::Export(args) => commands::export::run(args),
        Command::Share(args) => commands::share::run(args),
        Command::Import(args) => commands::import::run(args),
    }
}
