use crate::deck::arxiv_id::ArxivId;
use std::path::{Path, PathBuf};

/// On-disk layout of a paper collection.
///
/// ```text
/// <data-dir>/
///   index/papers.json
///   index/citations.json
///   papers/<ID>/metadata.json
///   papers/<ID>/summary.md
///   papers/<ID>/blog_post.md
///   papers/<ID>/annotations/*.json
/// ```
///
/// Per-paper paths take a validated `ArxivId`, so the ID-as-path-component
/// rule is enforced by construction.
#[derive(Debug, Clone)]
pub struct DeckPaths {
    pub data_dir: PathBuf,
}

impl DeckPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    pub fn index_file(&self) -> PathBuf {
        self.index_dir().join("papers.json")
    }

    pub fn citations_file(&self) -> PathBuf {
        self.index_dir().join("citations.json")
    }

    pub fn papers_dir(&self) -> PathBuf {
        self.data_dir.join("papers")
    }

    pub fn paper_dir(&self, id: &ArxivId) -> PathBuf {
        self.papers_dir().join(id.as_str())
    }

    pub fn metadata_file(&self, id: &ArxivId) -> PathBuf {
        self.paper_dir(id).join("metadata.json")
    }

    pub fn summary_file(&self, id: &ArxivId) -> PathBuf {
        self.paper_dir(id).join("summary.md")
    }

    pub fn blog_post_file(&self, id: &ArxivId) -> PathBuf {
        self.paper_dir(id).join("blog_post.md")
    }

    pub fn annotations_dir(&self, id: &ArxivId) -> PathBuf {
        self.paper_dir(id).join("annotations")
    }

    pub fn exists(&self) -> bool {
        self.data_dir.is_dir()
    }
}

impl AsRef<Path> for DeckPaths {
    fn as_ref(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_suite_convention() {
        let paths = DeckPaths::new("/data");
        let id = ArxivId::parse("2401.12345").expect("valid id");

        assert_eq!(paths.index_file(), PathBuf::from("/data/index/papers.json"));
        assert_eq!(
            paths.citations_file(),
            PathBuf::from("/data/index/citations.json")
        );
        assert_eq!(
            paths.metadata_file(&id),
            PathBuf::from("/data/papers/2401.12345/metadata.json")
        );
        assert_eq!(
            paths.annotations_dir(&id),
            PathBuf::from("/data/papers/2401.12345/annotations")
        );
    }
}
