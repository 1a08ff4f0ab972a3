use crate::deck::arxiv_id::{self, ArxivId};
use crate::deck::atomic;
use crate::deck::model::{IndexEntry, IndexRecord, PaperRecord};
use crate::deck::papers;
use crate::deck::paths::DeckPaths;
use crate::deck::tokenize;
use crate::deck::util::{now_iso, parse_iso};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Json,
    Csv,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "invalid format '{other}' (use markdown, json, csv)"
            )),
        }
    }
}

/// Which papers to export.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub paper_id: Option<ArxivId>,
    pub query: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

/// Apply the selection to the index, newest-collected first.
///
/// A query matches when ANY of its tokens appears as a substring of the
/// paper's title, abstract, or topics (same tokenizer as search, but
/// without ranking). Papers with an unparseable `collected_at` are only
/// dropped when a `since` filter is actually in play.
pub fn filter(index: &IndexRecord, selection: &Selection) -> Vec<(String, IndexEntry)> {
    let query_terms = selection
        .query
        .as_deref()
        .map(tokenize::query_terms)
        .unwrap_or_default();

    let mut out: Vec<(String, IndexEntry)> = Vec::new();
    for (id, entry) in &index.papers {
        if !arxiv_id::is_valid(id) {
            warn!(paper = id.as_str(), "skipping paper with invalid ID");
            continue;
        }
        if let Some(wanted) = &selection.paper_id {
            if id != wanted.as_str() {
                continue;
            }
        }
        if let Some(since) = selection.since {
            if !entry.collected_at.is_empty() {
                let Some(collected_at) = parse_iso(&entry.collected_at) else {
                    warn!(paper = id.as_str(), "invalid collected_at timestamp");
                    continue;
                };
                if collected_at < since {
                    continue;
                }
            }
        }
        if !query_terms.is_empty() {
            let searchable = format!(
                "{} {} {}",
                entry.title,
                entry.abstract_text,
                entry.topics.join(" ")
            )
            .to_lowercase();
            if !query_terms.iter().any(|term| searchable.contains(term)) {
                continue;
            }
        }
        out.push((id.clone(), entry.clone()));
    }

    out.sort_by(|a, b| b.1.collected_at.cmp(&a.1.collected_at));
    info!(papers = out.len(), "filtered papers for export");
    out
}

// Full metadata when available, index fallback otherwise. The fallback keeps
// exports working even when a metadata file was lost.
fn resolve_record(paths: &DeckPaths, id: &str, entry: &IndexEntry) -> PaperRecord {
    papers::load_raw(paths, id).unwrap_or_else(|| PaperRecord {
        id: id.to_string(),
        title: entry.title.clone(),
        authors: entry.authors.clone(),
        abstract_text: entry.abstract_text.clone(),
        topics: entry.topics.clone(),
        collected_at: entry.collected_at.clone(),
        has_summary: entry.has_summary,
        has_blog_post: entry.has_blog_post,
        annotation_count: entry.annotation_count,
        ..Default::default()
    })
}

/// One markdown file per paper, `paper_<ID>.md`, each written atomically.
pub fn export_markdown(
    paths: &DeckPaths,
    selected: &[(String, IndexEntry)],
    output_dir: &Path,
    include_summary: bool,
) -> Result<usize> {
    let today = Utc::now().format("%Y-%m-%d");
    let mut exported = 0usize;

    for (id, entry) in selected {
        let record = resolve_record(paths, id, entry);

        let mut lines: Vec<String> = Vec::new();
        let title = if record.title.is_empty() {
            "Untitled"
        } else {
            record.title.as_str()
        };
        lines.push(format!("# {title}"));
        lines.push(String::new());
        lines.push(format!("**arXiv:** [{id}](https://arxiv.org/abs/{id})"));
        if !record.authors.is_empty() {
            lines.push(format!("**Authors:** {}", record.authors.join(", ")));
        }
        if let Some(published) = &record.published {
            lines.push(format!("**Published:** {published}"));
        }
        if !record.categories.is_empty() {
            lines.push(format!("**Categories:** {}", record.categories.join(", ")));
        }
        lines.push(String::new());
        lines.push("## Abstract".to_string());
        lines.push(String::new());
        if record.abstract_text.is_empty() {
            lines.push("*No abstract available*".to_string());
        } else {
            lines.push(record.abstract_text.clone());
        }
        lines.push(String::new());

        if include_summary {
            if let Some(summary) = papers::load_summary_raw(paths, id) {
                lines.push("## Summary".to_string());
                lines.push(String::new());
                lines.push(summary);
                lines.push(String::new());
            }
        }

        lines.push("---".to_string());
        lines.push(String::new());
        lines.push(format!("*Exported on {today}*"));
        lines.push(String::new());

        let file = output_dir.join(format!("paper_{id}.md"));
        atomic::write_text(&file, &lines.join("\n"))?;
        exported += 1;
    }

    info!(papers = exported, "exported markdown");
    Ok(exported)
}

#[derive(Debug, Serialize)]
struct JsonExport {
    exported_at: String,
    count: usize,
    papers: Vec<serde_json::Value>,
}

/// Single `papers.json` with full metadata, plus inline summary content
/// when requested.
pub fn export_json(
    paths: &DeckPaths,
    selected: &[(String, IndexEntry)],
    output_dir: &Path,
    include_summary: bool,
) -> Result<usize> {
    let mut exported: Vec<serde_json::Value> = Vec::new();
    for (id, entry) in selected {
        let record = resolve_record(paths, id, entry);
        let mut value = serde_json::to_value(&record)?;
        if include_summary {
            if let (Some(object), Some(summary)) =
                (value.as_object_mut(), papers::load_summary_raw(paths, id))
            {
                object.insert("summary_content".to_string(), summary.into());
            }
        }
        exported.push(value);
    }

    let document = JsonExport {
        exported_at: now_iso(),
        count: exported.len(),
        papers: exported,
    };
    atomic::write_json(&output_dir.join("papers.json"), &document)?;

    info!(papers = document.count, "exported json");
    Ok(document.count)
}

const CSV_HEADER: &[&str] = &[
    "id",
    "title",
    "authors",
    "published",
    "categories",
    "has_summary",
    "pdf_url",
    "collected_at",
];

fn csv_field(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Single `papers.csv`, every field quoted.
pub fn export_csv(
    paths: &DeckPaths,
    selected: &[(String, IndexEntry)],
    output_dir: &Path,
) -> Result<usize> {
    let mut lines: Vec<String> = Vec::with_capacity(selected.len() + 1);
    lines.push(csv_row(
        &CSV_HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
    ));

    for (id, entry) in selected {
        let record = resolve_record(paths, id, entry);
        lines.push(csv_row(&[
            id.clone(),
            record.title,
            record.authors.join("; "),
            record.published.unwrap_or_default(),
            record.categories.join("; "),
            record.has_summary.to_string(),
            record.pdf_url.unwrap_or_default(),
            record.collected_at,
        ]));
    }

    let mut body = lines.join("\r\n");
    body.push_str("\r\n");
    atomic::write_text(&output_dir.join("papers.csv"), &body)?;

    info!(papers = selected.len(), "exported csv");
    Ok(selected.len())
}

/// Run one export, returning how many papers were written and where.
pub fn run(
    paths: &DeckPaths,
    selected: &[(String, IndexEntry)],
    format: Format,
    output_dir: &Path,
    include_summary: bool,
) -> Result<(usize, PathBuf)> {
    let count = match format {
        Format::Markdown => export_markdown(paths, selected, output_dir, include_summary)?,
        Format::Json => export_json(paths, selected, output_dir, include_summary)?,
        Format::Csv => export_csv(paths, selected, output_dir)?,
    };
    Ok((count, output_dir.to_path_buf()))
}
