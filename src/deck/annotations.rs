use crate::deck::arxiv_id::ArxivId;
use crate::deck::atomic;
use crate::deck::model::{Annotation, AnnotationType};
use crate::deck::papers;
use crate::deck::paths::DeckPaths;
use crate::deck::util::now_iso;
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use tracing::{info, warn};

pub const MIN_CONTENT_CHARS: usize = 1;
pub const MAX_CONTENT_CHARS: usize = 50_000;
const MAX_AUTHOR_CHARS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("paper {0} not found in collection")]
    PaperNotFound(String),
    #[error("{0}")]
    InvalidContent(String),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Sanitize an author name for use as a filename component: only
/// `[A-Za-z0-9_-]` survive, `..` is neutralized, length capped, empty
/// falls back to "anonymous".
pub fn sanitize_author(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    while out.contains("..") {
        out = out.replace("..", "_");
    }
    let out: String = out.chars().take(MAX_AUTHOR_CHARS).collect();
    if out.is_empty() {
        "anonymous".to_string()
    } else {
        out
    }
}

/// Save a new annotation and refresh the paper's `annotation_count`.
///
/// The annotation file itself is written atomically; the metadata count
/// update is an independently-failable step reported as a soft warning.
pub fn save(
    paths: &DeckPaths,
    id: &ArxivId,
    content: &str,
    author: &str,
    kind: AnnotationType,
) -> Result<Annotation, AnnotateError> {
    let chars = content.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Err(AnnotateError::InvalidContent(
            "annotation content cannot be empty".to_string(),
        ));
    }
    if chars > MAX_CONTENT_CHARS {
        return Err(AnnotateError::InvalidContent(format!(
            "annotation content too long (max {MAX_CONTENT_CHARS} characters)"
        )));
    }
    if !paths.paper_dir(id).exists() {
        return Err(AnnotateError::PaperNotFound(id.to_string()));
    }

    let annotation_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    let author = sanitize_author(author);
    let now = now_iso();
    let annotation = Annotation {
        id: annotation_id,
        paper_id: id.to_string(),
        author: author.clone(),
        created_at: now.clone(),
        updated_at: now,
        kind,
        content: content.to_string(),
    };

    // Filename encodes author + timestamp + id for natural sort and
    // uniqueness across authors.
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let filename = format!("{author}_{stamp}_{}.json", annotation.id);
    let file = paths.annotations_dir(id).join(filename);
    atomic::write_json(&file, &annotation).map_err(AnnotateError::Io)?;

    let count = count(paths, id);
    if !papers::set_annotation_count(paths, id, count as u64) {
        warn!(paper = id.as_str(), "annotation saved but metadata count update failed");
    }

    info!(paper = id.as_str(), annotation = annotation.id.as_str(), "saved annotation");
    Ok(annotation)
}

/// All annotations for a paper, oldest first. Unreadable files are skipped.
pub fn list(paths: &DeckPaths, id: &ArxivId) -> Result<Vec<Annotation>> {
    let dir = paths.annotations_dir(id);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match atomic::read_json::<Annotation>(&path) {
            Ok(annotation) => out.push(annotation),
            Err(err) => {
                warn!(file = %path.display(), "skipping unreadable annotation: {err:#}");
            }
        }
    }

    out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(out)
}

/// Number of annotation files currently on disk for a paper.
pub fn count(paths: &DeckPaths, id: &ArxivId) -> usize {
    let dir = paths.annotations_dir(id);
    let Ok(entries) = fs::read_dir(&dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext == "json")
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::model::PaperRecord;
    use tempfile::tempdir;

    fn seed_paper(paths: &DeckPaths, id: &str) -> ArxivId {
        let record = PaperRecord {
            id: id.to_string(),
            title: "t".to_string(),
            collected_at: now_iso(),
            ..Default::default()
        };
        assert!(papers::create(paths, &record).expect("create"));
        ArxivId::parse(id).expect("valid id")
    }

    #[test]
    fn sanitizes_hostile_authors() {
        assert_eq!(sanitize_author("alice"), "alice");
        assert_eq!(sanitize_author("../../etc"), "______etc");
        assert_eq!(sanitize_author("a b!c"), "a_b_c");
        assert_eq!(sanitize_author(""), "anonymous");
        assert_eq!(sanitize_author("x".repeat(80).as_str()).len(), 50);
    }

    #[test]
    fn save_then_list_roundtrips_and_counts() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        let id = seed_paper(&paths, "2401.12345");

        let first = save(&paths, &id, "great paper", "alice", AnnotationType::Note)
            .expect("save first");
        let _second = save(&paths, &id, "what about scaling?", "bob", AnnotationType::Question)
            .expect("save second");

        let listed = list(&paths, &id).expect("list");
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|a| a.id == first.id));

        let stored = papers::load(&paths, &id).expect("paper exists");
        assert_eq!(stored.annotation_count, 2);
    }

    #[test]
    fn rejects_empty_and_oversized_content() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        let id = seed_paper(&paths, "2401.12345");

        assert!(matches!(
            save(&paths, &id, "", "alice", AnnotationType::Note),
            Err(AnnotateError::InvalidContent(_))
        ));
        let huge = "x".repeat(MAX_CONTENT_CHARS + 1);
        assert!(matches!(
            save(&paths, &id, &huge, "alice", AnnotationType::Note),
            Err(AnnotateError::InvalidContent(_))
        ));
    }

    #[test]
    fn rejects_unknown_paper() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        let id = ArxivId::parse("2401.99999").expect("valid id");
        assert!(matches!(
            save(&paths, &id, "note", "alice", AnnotationType::Note),
            Err(AnnotateError::PaperNotFound(_))
        ));
    }

    #[test]
    fn listing_missing_dir_is_empty() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());
        let id = seed_paper(&paths, "2401.12345");
        assert!(list(&paths, &id).expect("list").is_empty());
        assert_eq!(count(&paths, &id), 0);
    }
}
