use crate::deck::arxiv_id;
use crate::deck::excerpt;
use crate::deck::index::{self, IndexLoadError};
use crate::deck::papers;
use crate::deck::paths::DeckPaths;
use crate::deck::score;
use crate::deck::tokenize;
use crate::deck::util::round2;
use serde::Serialize;
use tracing::{info, warn};

pub const DEFAULT_LIMIT: usize = 10;
pub const MIN_QUERY_CHARS: usize = 1;
pub const MAX_QUERY_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Index(#[from] IndexLoadError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub score: f64,
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchHit>,
    /// Full index count regardless of filtering, so callers can tell
    /// "no matches" from "empty collection".
    pub total_papers: usize,
}

/// Ranked keyword search over the collection.
///
/// Scores every validly-identified paper in the index, loading its summary
/// lazily only when `has_summary` is set, keeps strictly-positive scores,
/// and returns the top `limit` ordered by descending score. Ties keep the
/// index's ascending-ID iteration order (stable sort over a `BTreeMap`).
pub fn search(
    paths: &DeckPaths,
    query: &str,
    limit: usize,
) -> Result<SearchOutcome, SearchError> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(SearchError::InvalidQuery("query cannot be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(SearchError::InvalidQuery(format!(
            "query too long (max {MAX_QUERY_CHARS} characters)"
        )));
    }

    let index = index::load(paths)?;
    let total_papers = index.papers.len();
    if total_papers == 0 {
        return Ok(SearchOutcome {
            results: Vec::new(),
            total_papers: 0,
        });
    }

    let terms = tokenize::query_terms(query);
    if terms.is_empty() {
        return Ok(SearchOutcome {
            results: Vec::new(),
            total_papers,
        });
    }
    info!(?terms, "searching");

    struct Scored<'a> {
        score: f64,
        id: &'a str,
        entry: &'a crate::deck::model::IndexEntry,
        summary: Option<String>,
    }

    let mut scored: Vec<Scored> = Vec::new();
    for (id, entry) in &index.papers {
        if !arxiv_id::is_valid(id) {
            warn!(paper = id.as_str(), "skipping paper with invalid ID");
            continue;
        }

        // Summary files are only opened when the index says one exists, and
        // kept around so excerpt extraction does not re-read them.
        let summary = if entry.has_summary {
            papers::load_summary_raw(paths, id)
        } else {
            None
        };

        let score = score::relevance(&terms, entry, summary.as_deref());
        if score > 0.0 {
            scored.push(Scored {
                score,
                id,
                entry,
                summary,
            });
        }
    }

    // Stable descending sort: equal scores stay in ascending-ID order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let results = scored
        .into_iter()
        .take(limit)
        .map(|item| {
            let excerpt_text = item
                .summary
                .as_deref()
                .unwrap_or(item.entry.abstract_text.as_str());
            SearchHit {
                id: item.id.to_string(),
                title: item.entry.title.clone(),
                authors: item.entry.authors.clone(),
                score: round2(item.score),
                excerpt: excerpt::extract(&terms, excerpt_text),
            }
        })
        .collect::<Vec<_>>();

    info!(matches = results.len(), "search complete");
    Ok(SearchOutcome {
        results,
        total_papers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::model::{IndexEntry, IndexRecord, PaperRecord};
    use crate::deck::util::now_iso;
    use tempfile::tempdir;

    fn seed(paths: &DeckPaths, papers: &[(&str, &str, &str)]) {
        let mut index = IndexRecord::default();
        for (id, title, abstract_text) in papers {
            let record = PaperRecord {
                id: id.to_string(),
                title: title.to_string(),
                abstract_text: abstract_text.to_string(),
                collected_at: now_iso(),
                ..Default::default()
            };
            assert!(crate::deck::papers::create(paths, &record).expect("create"));
            index
                .papers
                .insert(id.to_string(), IndexEntry::from_record(&record));
        }
        index::save(paths, &mut index).expect("save index");
    }

    #[test]
    fn ranks_title_matches_above_abstract_matches() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        seed(
            &paths,
            &[
                ("2401.00001", "Attention mechanisms in depth", "transformers"),
                ("2401.00002", "Recurrent networks", "we study attention mechanisms"),
                ("2401.00003", "Graph models", "message passing"),
            ],
        );

        let outcome = search(&paths, "attention mechanisms", 10).expect("search");
        assert_eq!(outcome.total_papers, 3);
        let ids: Vec<_> = outcome.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2401.00001", "2401.00002"]);
        assert!(outcome.results[0].score > outcome.results[1].score);
    }

    #[test]
    fn zero_score_papers_are_excluded_regardless_of_limit() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        seed(&paths, &[("2401.00001", "Graph models", "message passing")]);

        let outcome = search(&paths, "attention", 100).expect("search");
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.total_papers, 1);
    }

    #[test]
    fn limit_truncates_after_ranking() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        seed(
            &paths,
            &[
                ("2401.00001", "attention a", ""),
                ("2401.00002", "attention b", ""),
                ("2401.00003", "attention c", ""),
            ],
        );

        let outcome = search(&paths, "attention", 2).expect("search");
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.total_papers, 3);
        // Equal scores tie-break by ascending paper ID.
        assert_eq!(outcome.results[0].id, "2401.00001");
        assert_eq!(outcome.results[1].id, "2401.00002");
    }

    #[test]
    fn summary_contributes_when_flagged() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        seed(&paths, &[("2401.00001", "Some paper", "about nothing")]);

        let id = crate::deck::arxiv_id::ArxivId::parse("2401.00001").expect("valid");
        std::fs::write(paths.summary_file(&id), "this summary mentions attention")
            .expect("write summary");
        crate::deck::papers::mark_summary(&paths, &id);
        index::update_entry(&paths, &id, |entry| entry.has_summary = true);

        let outcome = search(&paths, "attention", 10).expect("search");
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].score, 1.5);
        // Excerpt drawn from the summary, not the abstract.
        assert!(outcome.results[0].excerpt.contains("attention"));
    }

    #[test]
    fn empty_query_is_invalid() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        assert!(matches!(
            search(&paths, "   ", 10),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn over_long_query_is_invalid() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        let query = "x".repeat(MAX_QUERY_CHARS + 1);
        assert!(matches!(
            search(&paths, &query, 10),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn missing_index_is_a_hard_error() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        assert!(matches!(
            search(&paths, "attention", 10),
            Err(SearchError::Index(IndexLoadError::NotFound(_)))
        ));
    }
}
