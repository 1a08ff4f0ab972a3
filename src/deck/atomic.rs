use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// The temp file is created in the destination's directory so the final
/// rename never crosses filesystems. On any failure the temp file is removed
/// (dropped) and the destination is left untouched; a reader can never
/// observe a half-written document.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("no parent directory for {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    let data = serde_json::to_string_pretty(value)?;
    tmp.write_all(data.as_bytes())
        .and_then(|()| tmp.write_all(b"\n"))
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Atomically replace `path` with raw text content. Same discipline as
/// `write_json`, used for markdown artifacts (digests, exports, blog posts).
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("no parent directory for {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Read and deserialize a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        tags: Vec<String>,
        count: u64,
    }

    #[test]
    fn write_then_read_roundtrips() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("nested/dir/doc.json");
        let doc = Doc {
            name: "attention is all you need".to_string(),
            tags: vec!["cs.CL".to_string(), "cs.LG".to_string()],
            count: 3,
        };

        write_json(&path, &doc).expect("write");
        let loaded: Doc = read_json(&path).expect("read");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn replace_leaves_no_temp_files_behind() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("doc.json");
        write_json(&path, &serde_json::json!({"v": 1})).expect("first write");
        write_json(&path, &serde_json::json!({"v": 2})).expect("second write");

        let entries: Vec<_> = std::fs::read_dir(tmp.path())
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("doc.json")]);

        let loaded: serde_json::Value = read_json(&path).expect("read");
        assert_eq!(loaded["v"], 2);
    }
}
