use crate::deck::util::now_iso;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const INDEX_VERSION: &str = "1.0";

/// Number of abstract characters duplicated into the index for fast listing.
pub const INDEX_ABSTRACT_CHARS: usize = 500;

/// Full per-paper record stored at `papers/<ID>/metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Set once when the paper is first stored, never updated.
    pub collected_at: String,
    pub topics: Vec<String>,
    pub has_summary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_generated_at: Option<String>,
    pub has_blog_post: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_post_generated_at: Option<String>,
    pub annotation_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_data: Option<CitationData>,
    /// Provenance stamps set only on records brought in from a shared package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_from: Option<String>,
}

impl Default for PaperRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            authors: Vec::new(),
            abstract_text: String::new(),
            published: None,
            updated: None,
            categories: Vec::new(),
            pdf_url: None,
            collected_at: String::new(),
            topics: Vec::new(),
            has_summary: false,
            summary_generated_at: None,
            has_blog_post: false,
            blog_post_generated_at: None,
            annotation_count: 0,
            citation_data: None,
            imported_at: None,
            imported_from: None,
        }
    }
}

/// Citation sub-record. Tagged on `source` so consumers must handle both the
/// fetched and the not-found-upstream case explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum CitationData {
    #[serde(rename = "semantic_scholar")]
    SemanticScholar {
        fetched_at: String,
        citation_count: u64,
        reference_count: u64,
        references_in_collection: Vec<String>,
        cited_by_in_collection: Vec<String>,
    },
    #[serde(rename = "unavailable")]
    Unavailable { fetched_at: String },
}

impl CitationData {
    pub fn references_in_collection(&self) -> &[String] {
        match self {
            Self::SemanticScholar {
                references_in_collection,
                ..
            } => references_in_collection,
            Self::Unavailable { .. } => &[],
        }
    }

    pub fn cited_by_in_collection(&self) -> &[String] {
        match self {
            Self::SemanticScholar {
                cited_by_in_collection,
                ..
            } => cited_by_in_collection,
            Self::Unavailable { .. } => &[],
        }
    }
}

/// Abbreviated paper view kept in the global index for listing and search
/// without opening every metadata file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexEntry {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub topics: Vec<String>,
    pub collected_at: String,
    pub has_summary: bool,
    pub has_blog_post: bool,
    pub annotation_count: u64,
}

impl IndexEntry {
    pub fn from_record(record: &PaperRecord) -> Self {
        Self {
            title: record.title.clone(),
            authors: record.authors.clone(),
            abstract_text: record.abstract_text.chars().take(INDEX_ABSTRACT_CHARS).collect(),
            topics: record.topics.clone(),
            collected_at: record.collected_at.clone(),
            has_summary: record.has_summary,
            has_blog_post: record.has_blog_post,
            annotation_count: record.annotation_count,
        }
    }
}

/// The single global index document at `index/papers.json`.
///
/// `papers` is a `BTreeMap` so iteration order (and therefore tie-breaking in
/// ranked listings) is deterministic: ascending paper ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRecord {
    pub version: String,
    pub updated_at: String,
    pub papers: BTreeMap<String, IndexEntry>,
}

impl Default for IndexRecord {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION.to_string(),
            updated_at: now_iso(),
            papers: BTreeMap::new(),
        }
    }
}

/// One free-text annotation, stored as its own file under
/// `papers/<ID>/annotations/`. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub paper_id: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Note,
    Highlight,
    Question,
    Comment,
}

impl AnnotationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Highlight => "highlight",
            Self::Question => "question",
            Self::Comment => "comment",
        }
    }
}

impl std::str::FromStr for AnnotationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Self::Note),
            "highlight" => Ok(Self::Highlight),
            "question" => Ok(Self::Question),
            "comment" => Ok(Self::Comment),
            other => Err(format!(
                "unknown annotation type '{other}' (use note, highlight, question, comment)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_data_tag_roundtrips() {
        let data = CitationData::SemanticScholar {
            fetched_at: "2024-01-15T10:30:00+00:00".to_string(),
            citation_count: 12,
            reference_count: 30,
            references_in_collection: vec!["2401.00001".to_string()],
            cited_by_in_collection: vec![],
        };
        let raw = serde_json::to_string(&data).expect("serialize");
        assert!(raw.contains("\"source\":\"semantic_scholar\""));

        let back: CitationData = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back.references_in_collection(), ["2401.00001".to_string()]);
    }

    #[test]
    fn unavailable_has_no_edges() {
        let data = CitationData::Unavailable {
            fetched_at: "2024-01-15T10:30:00+00:00".to_string(),
        };
        assert!(data.references_in_collection().is_empty());
        assert!(data.cited_by_in_collection().is_empty());
    }

    #[test]
    fn index_entry_truncates_abstract() {
        let record = PaperRecord {
            id: "2401.12345".to_string(),
            abstract_text: "x".repeat(800),
            ..Default::default()
        };
        let entry = IndexEntry::from_record(&record);
        assert_eq!(entry.abstract_text.chars().count(), INDEX_ABSTRACT_CHARS);
    }

    #[test]
    fn paper_record_tolerates_missing_flags() {
        // Older records written before blog/annotation support must load.
        let raw = r#"{
            "id": "2401.12345",
            "title": "T",
            "authors": [],
            "abstract": "A",
            "categories": [],
            "collected_at": "2024-01-15T10:30:00+00:00",
            "topics": [],
            "has_summary": false
        }"#;
        let record: PaperRecord = serde_json::from_str(raw).expect("deserialize");
        assert!(!record.has_blog_post);
        assert_eq!(record.annotation_count, 0);
        assert!(record.citation_data.is_none());
    }
}
