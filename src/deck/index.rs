use crate::deck::atomic;
use crate::deck::model::IndexRecord;
use crate::deck::paths::DeckPaths;
use crate::deck::util::now_iso;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Why a strict index load failed. Read-path tools (search, export, digest,
/// graph) surface these as hard errors with stable codes; write-path tools
/// use `load_or_default` instead and never see them.
#[derive(Debug, thiserror::Error)]
pub enum IndexLoadError {
    #[error("index file not found: {0}")]
    NotFound(PathBuf),
    #[error("index file is corrupted: {path}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read index file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Strict load for read-path tools: a missing index is a user-actionable
/// error ("nothing collected yet"), not an empty result.
pub fn load(paths: &DeckPaths) -> Result<IndexRecord, IndexLoadError> {
    let file = paths.index_file();
    if !file.exists() {
        return Err(IndexLoadError::NotFound(file));
    }
    let raw = fs::read_to_string(&file).map_err(|source| IndexLoadError::Io {
        path: file.clone(),
        source,
    })?;
    let index: IndexRecord =
        serde_json::from_str(&raw).map_err(|source| IndexLoadError::Corrupt {
            path: file.clone(),
            source,
        })?;
    info!(papers = index.papers.len(), "loaded index");
    Ok(index)
}

/// Tolerant load for write-path tools: missing or corrupt index means
/// "start fresh" (bootstrap case), never a crash.
pub fn load_or_default(paths: &DeckPaths) -> IndexRecord {
    match load(paths) {
        Ok(index) => index,
        Err(IndexLoadError::NotFound(_)) => {
            info!("no existing index found, starting a new one");
            IndexRecord::default()
        }
        Err(err) => {
            warn!("unreadable index, starting a new one: {err:#}");
            IndexRecord::default()
        }
    }
}

/// Atomically persist the index, bumping `updated_at`.
pub fn save(paths: &DeckPaths, index: &mut IndexRecord) -> Result<()> {
    index.updated_at = now_iso();
    atomic::write_json(&paths.index_file(), index)?;
    info!(papers = index.papers.len(), "saved index");
    Ok(())
}

/// Read-modify-atomic-write of a single index entry.
///
/// Returns false (not an error) when the index is absent, unreadable, or the
/// paper is not listed, so callers can treat metadata/index desync as a soft
/// warning rather than rolling anything back.
pub fn update_entry(
    paths: &DeckPaths,
    id: &crate::deck::arxiv_id::ArxivId,
    apply: impl FnOnce(&mut crate::deck::model::IndexEntry),
) -> bool {
    let mut index = match load(paths) {
        Ok(index) => index,
        Err(err) => {
            warn!(paper = id.as_str(), "cannot update index entry: {err:#}");
            return false;
        }
    };

    let Some(entry) = index.papers.get_mut(id.as_str()) else {
        warn!(paper = id.as_str(), "paper not present in index");
        return false;
    };
    apply(entry);

    match save(paths, &mut index) {
        Ok(()) => true,
        Err(err) => {
            warn!(paper = id.as_str(), "failed to save index: {err:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::model::IndexEntry;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn strict_load_distinguishes_missing_from_corrupt() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());

        assert!(matches!(load(&paths), Err(IndexLoadError::NotFound(_))));

        fs::create_dir_all(paths.index_dir()).expect("mkdir");
        fs::write(paths.index_file(), "{not json").expect("write");
        assert!(matches!(load(&paths), Err(IndexLoadError::Corrupt { .. })));
    }

    #[test]
    fn tolerant_load_returns_empty_index_for_both_cases() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());

        assert!(load_or_default(&paths).papers.is_empty());

        fs::create_dir_all(paths.index_dir()).expect("mkdir");
        fs::write(paths.index_file(), "{not json").expect("write");
        assert!(load_or_default(&paths).papers.is_empty());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path());

        let mut index = IndexRecord::default();
        index.papers.insert(
            "2401.12345".to_string(),
            IndexEntry {
                title: "Attention Is All You Need".to_string(),
                ..Default::default()
            },
        );
        save(&paths, &mut index).expect("save");

        let loaded = load(&paths).expect("load");
        assert_eq!(loaded.papers.len(), 1);
        assert_eq!(
            loaded.papers["2401.12345"].title,
            "Attention Is All You Need"
        );
    }
}
