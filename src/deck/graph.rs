use crate::deck::arxiv_id;
use crate::deck::atomic;
use crate::deck::index::{self, IndexLoadError};
use crate::deck::papers;
use crate::deck::paths::DeckPaths;
use crate::deck::util::now_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_TOP_N: usize = 10;
pub const CITATIONS_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphEdges {
    pub references: Vec<String>,
    pub cited_by: Vec<String>,
}

/// Derived, rebuildable citation view: paper ID -> in-collection edges.
/// Keyed by a `BTreeMap` so iteration (and ranking tie-breaks) follow
/// ascending paper ID.
pub type CitationGraph = BTreeMap<String, GraphEdges>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub total_papers: usize,
    pub papers_with_citations: usize,
    pub total_edges: usize,
}

/// Assemble the citation graph from per-paper `citation_data`.
///
/// Every ID listed as an edge is re-validated defensively even though the
/// citation fetcher already filtered them; anything invalid is dropped. A
/// paper whose metadata fails to load is excluded, not an error.
pub fn build(paths: &DeckPaths) -> Result<CitationGraph, IndexLoadError> {
    let index = index::load(paths)?;

    let mut graph = CitationGraph::new();
    for id in index.papers.keys() {
        if !arxiv_id::is_valid(id) {
            warn!(paper = id.as_str(), "skipping invalid paper ID in index");
            continue;
        }
        let Some(record) = papers::load_raw(paths, id) else {
            continue;
        };

        let edges = match record.citation_data {
            Some(data) => GraphEdges {
                references: valid_ids(data.references_in_collection()),
                cited_by: valid_ids(data.cited_by_in_collection()),
            },
            None => GraphEdges::default(),
        };
        graph.insert(id.clone(), edges);
    }

    info!(papers = graph.len(), "built citation graph");
    Ok(graph)
}

fn valid_ids(raw: &[String]) -> Vec<String> {
    raw.iter()
        .filter(|id| {
            let ok = arxiv_id::is_valid(id);
            if !ok {
                warn!(paper = id.as_str(), "dropping invalid citation edge");
            }
            ok
        })
        .cloned()
        .collect()
}

/// Aggregate counts. `total_edges` counts reference lists only; `cited_by`
/// is the inverse view of the same edges and must not be double counted.
pub fn stats(graph: &CitationGraph) -> GraphStats {
    let mut out = GraphStats {
        total_papers: graph.len(),
        ..Default::default()
    };
    for edges in graph.values() {
        if !edges.references.is_empty() || !edges.cited_by.is_empty() {
            out.papers_with_citations += 1;
        }
        out.total_edges += edges.references.len();
    }
    out
}

/// Top `top_n` papers by in-collection inbound citations, descending.
/// Zero-citation papers never appear; ties keep ascending-ID order.
pub fn highly_cited(graph: &CitationGraph, top_n: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = graph
        .iter()
        .map(|(id, edges)| (id.clone(), edges.cited_by.len()))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .take(top_n)
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CitationsIndex {
    pub version: String,
    pub updated_at: String,
    pub graph: CitationGraph,
    pub stats: CitationsIndexStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CitationsIndexStats {
    #[serde(flatten)]
    pub counts: GraphStats,
    pub highly_cited: Vec<String>,
}

/// Atomically persist `index/citations.json`.
pub fn save(
    paths: &DeckPaths,
    graph: &CitationGraph,
    stats: GraphStats,
    highly_cited: &[(String, usize)],
) -> Result<PathBuf> {
    let file = paths.citations_file();
    let document = CitationsIndex {
        version: CITATIONS_VERSION.to_string(),
        updated_at: now_iso(),
        graph: graph.clone(),
        stats: CitationsIndexStats {
            counts: stats,
            highly_cited: highly_cited.iter().map(|(id, _)| id.clone()).collect(),
        },
    };
    atomic::write_json(&file, &document)?;
    info!(path = %file.display(), "saved citations index");
    Ok(file)
}
