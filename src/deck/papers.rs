use crate::deck::arxiv_id::{self, ArxivId};
use crate::deck::atomic;
use crate::deck::model::{CitationData, PaperRecord};
use crate::deck::paths::DeckPaths;
use crate::deck::util::now_iso;
use anyhow::{Context, Result};
use std::fs;
use tracing::{debug, warn};

/// Load a paper's metadata. Absent on missing file or invalid JSON — the
/// per-paper store never raises on a paper that simply isn't there.
pub fn load(paths: &DeckPaths, id: &ArxivId) -> Option<PaperRecord> {
    let file = paths.metadata_file(id);
    if !file.exists() {
        return None;
    }
    match atomic::read_json(&file) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(paper = id.as_str(), "failed to read metadata: {err:#}");
            None
        }
    }
}

/// Like `load`, but takes an unvalidated ID (e.g. straight out of an index
/// key) and treats an invalid shape the same as a missing paper.
pub fn load_raw(paths: &DeckPaths, raw_id: &str) -> Option<PaperRecord> {
    let Some(id) = ArxivId::parse(raw_id) else {
        warn!(paper = raw_id, "invalid arXiv ID, skipping metadata load");
        return None;
    };
    load(paths, &id)
}

/// Store a new paper. Returns true when newly created, false when the ID is
/// missing/invalid or the paper already exists on disk (duplicates are
/// detected by file presence and the existing record is kept untouched).
pub fn create(paths: &DeckPaths, record: &PaperRecord) -> Result<bool> {
    if record.id.is_empty() {
        warn!("paper has no ID, skipping");
        return Ok(false);
    }
    let Some(id) = ArxivId::parse(&record.id) else {
        warn!(paper = record.id.as_str(), "invalid arXiv ID, skipping");
        return Ok(false);
    };

    let metadata_file = paths.metadata_file(&id);
    if metadata_file.exists() {
        debug!(paper = id.as_str(), "paper already exists, skipping");
        return Ok(false);
    }

    let paper_dir = paths.paper_dir(&id);
    fs::create_dir_all(&paper_dir)
        .with_context(|| format!("failed to create {}", paper_dir.display()))?;

    if let Err(err) = atomic::write_json(&metadata_file, record) {
        // Leave no partially-created paper directory behind.
        let _ = fs::remove_dir_all(&paper_dir);
        return Err(err);
    }
    debug!(paper = id.as_str(), "stored paper");
    Ok(true)
}

fn update(paths: &DeckPaths, id: &ArxivId, apply: impl FnOnce(&mut PaperRecord)) -> bool {
    let file = paths.metadata_file(id);
    if !file.exists() {
        warn!(paper = id.as_str(), "metadata file not found");
        return false;
    }
    let mut record: PaperRecord = match atomic::read_json(&file) {
        Ok(record) => record,
        Err(err) => {
            warn!(paper = id.as_str(), "failed to read metadata: {err:#}");
            return false;
        }
    };

    apply(&mut record);

    match atomic::write_json(&file, &record) {
        Ok(()) => true,
        Err(err) => {
            warn!(paper = id.as_str(), "failed to write metadata: {err:#}");
            false
        }
    }
}

/// Flip `has_summary` and stamp `summary_generated_at`.
pub fn mark_summary(paths: &DeckPaths, id: &ArxivId) -> bool {
    update(paths, id, |record| {
        record.has_summary = true;
        record.summary_generated_at = Some(now_iso());
    })
}

/// Flip `has_blog_post` and stamp `blog_post_generated_at`.
pub fn mark_blog_post(paths: &DeckPaths, id: &ArxivId) -> bool {
    update(paths, id, |record| {
        record.has_blog_post = true;
        record.blog_post_generated_at = Some(now_iso());
    })
}

pub fn set_annotation_count(paths: &DeckPaths, id: &ArxivId, count: u64) -> bool {
    update(paths, id, |record| {
        record.annotation_count = count;
    })
}

pub fn set_citation_data(paths: &DeckPaths, id: &ArxivId, data: CitationData) -> bool {
    update(paths, id, |record| {
        record.citation_data = Some(data);
    })
}

/// Load a paper's generated summary, if any. Tolerant: unreadable summaries
/// degrade to "no summary", they never fail a search.
pub fn load_summary(paths: &DeckPaths, id: &ArxivId) -> Option<String> {
    let file = paths.summary_file(id);
    if !file.exists() {
        return None;
    }
    match fs::read_to_string(&file) {
        Ok(content) => Some(content),
        Err(err) => {
            warn!(paper = id.as_str(), "failed to read summary: {err}");
            None
        }
    }
}

/// Re-validate an unvalidated ID before a summary load, as search does for
/// IDs coming out of the index.
pub fn load_summary_raw(paths: &DeckPaths, raw_id: &str) -> Option<String> {
    if !arxiv_id::is_valid(raw_id) {
        warn!(paper = raw_id, "invalid arXiv ID, skipping summary load");
        return None;
    }
    let id = ArxivId::parse(raw_id)?;
    load_summary(paths, &id)
}
