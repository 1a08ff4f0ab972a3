use crate::deck::annotations::sanitize_author;
use crate::deck::arxiv_id::{self, ArxivId};
use crate::deck::atomic;
use crate::deck::index::{self, IndexLoadError};
use crate::deck::model::{IndexEntry, IndexRecord, PaperRecord};
use crate::deck::paths::DeckPaths;
use crate::deck::util::now_iso;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const MANIFEST_VERSION: &str = "1.0";

const REQUIRED_MANIFEST_FIELDS: &[&str] = &["version", "created_at", "paper_count"];

// Limits applied to an incoming package before anything is extracted.
const MAX_ENTRY_BYTES: u64 = 100 * 1024 * 1024;
const MAX_TOTAL_BYTES: u64 = 500 * 1024 * 1024;
const MAX_ENTRY_COUNT: usize = 10_000;
const MAX_COMPRESSION_RATIO: u64 = 100;

/// `manifest.json` at the root of every collection package.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub created_at: String,
    pub created_by: String,
    pub paper_count: u64,
    pub includes_summaries: bool,
    pub includes_annotations: bool,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("paper {0} not found in collection")]
    PaperNotFound(String),
    #[error(transparent)]
    Index(#[from] IndexLoadError),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("package file not found: {0}")]
    NotFound(PathBuf),
    #[error("{0}")]
    BadZip(String),
    #[error("{0}")]
    BadPackage(String),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

#[derive(Debug)]
pub struct ShareRequest<'a> {
    /// Papers to package; empty means the whole collection.
    pub paper_ids: &'a [ArxivId],
    pub include_summaries: bool,
    pub include_annotations: bool,
    pub username: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
    pub annotations: usize,
    pub imported_ids: Vec<String>,
}

/// Package papers into a shareable ZIP archive at `output`.
///
/// Layout mirrors the data directory: `papers/<ID>/metadata.json` plus
/// optional `summary.md` and `annotations/*.json`, a partial
/// `index/papers.json` covering only the shared papers, and a
/// `manifest.json` describing the package. With nothing to share the
/// archive is not created at all.
pub fn share(
    paths: &DeckPaths,
    req: &ShareRequest<'_>,
    output: &Path,
) -> Result<Vec<String>, ShareError> {
    let index_record = index::load(paths)?;

    for wanted in req.paper_ids {
        if !index_record.papers.contains_key(wanted.as_str()) {
            return Err(ShareError::PaperNotFound(wanted.to_string()));
        }
    }

    let selected: Vec<(&String, &IndexEntry)> = index_record
        .papers
        .iter()
        .filter(|(id, _)| arxiv_id::is_valid(id))
        .filter(|(id, _)| {
            req.paper_ids.is_empty() || req.paper_ids.iter().any(|w| w.as_str() == id.as_str())
        })
        .collect();

    if selected.is_empty() {
        info!("nothing to share");
        return Ok(Vec::new());
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))
                .map_err(ShareError::Io)?;
        }
    }
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))
        .map_err(ShareError::Io)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut shared_ids: Vec<String> = Vec::new();
    let mut shared_entries: BTreeMap<String, IndexEntry> = BTreeMap::new();

    for (raw_id, entry) in selected {
        // Index keys are re-validated above; parse cannot fail here.
        let Some(id) = ArxivId::parse(raw_id) else {
            continue;
        };

        let metadata = match fs::read(paths.metadata_file(&id)) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(paper = id.as_str(), "skipping paper without metadata: {err}");
                continue;
            }
        };
        add_entry(
            &mut zip,
            options,
            &format!("papers/{id}/metadata.json"),
            &metadata,
        )?;

        if req.include_summaries {
            if let Ok(summary) = fs::read(paths.summary_file(&id)) {
                add_entry(&mut zip, options, &format!("papers/{id}/summary.md"), &summary)?;
            }
        }

        if req.include_annotations {
            if let Ok(entries) = fs::read_dir(paths.annotations_dir(&id)) {
                for dir_entry in entries.filter_map(|e| e.ok()) {
                    let path = dir_entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    match fs::read(&path) {
                        Ok(bytes) => add_entry(
                            &mut zip,
                            options,
                            &format!("papers/{id}/annotations/{name}"),
                            &bytes,
                        )?,
                        Err(err) => {
                            warn!(file = %path.display(), "skipping unreadable annotation: {err}");
                        }
                    }
                }
            }
        }

        shared_entries.insert(raw_id.clone(), entry.clone());
        shared_ids.push(raw_id.clone());
    }

    let partial = IndexRecord {
        version: index_record.version.clone(),
        updated_at: now_iso(),
        papers: shared_entries,
    };
    let partial_raw = serde_json::to_string_pretty(&partial)
        .context("failed to render package index")
        .map_err(ShareError::Io)?;
    add_entry(&mut zip, options, "index/papers.json", partial_raw.as_bytes())?;

    let manifest = Manifest {
        version: MANIFEST_VERSION.to_string(),
        created_at: now_iso(),
        created_by: sanitize_author(req.username),
        paper_count: shared_ids.len() as u64,
        includes_summaries: req.include_summaries,
        includes_annotations: req.include_annotations,
        description: req.description.unwrap_or_default().to_string(),
    };
    let manifest_raw = serde_json::to_string_pretty(&manifest)
        .context("failed to render package manifest")
        .map_err(ShareError::Io)?;
    add_entry(&mut zip, options, "manifest.json", manifest_raw.as_bytes())?;

    zip.finish()
        .with_context(|| format!("failed to finalize {}", output.display()))
        .map_err(ShareError::Io)?;

    info!(papers = shared_ids.len(), output = %output.display(), "created package");
    Ok(shared_ids)
}

fn add_entry(
    zip: &mut ZipWriter<File>,
    options: SimpleFileOptions,
    name: &str,
    bytes: &[u8],
) -> Result<(), ShareError> {
    zip.start_file(name, options)
        .with_context(|| format!("failed to add package entry {name}"))
        .map_err(ShareError::Io)?;
    zip.write_all(bytes)
        .with_context(|| format!("failed to write package entry {name}"))
        .map_err(ShareError::Io)?;
    Ok(())
}

/// Import a collection package into the data directory.
///
/// The whole archive is inspected before anything touches the filesystem:
/// entry counts, sizes, and compression ratios are bounded, hostile entry
/// paths are rejected, and the manifest must carry its required fields.
/// Every paper is then re-validated through `ArxivId` before extraction.
/// Papers already in the collection are skipped unless `overwrite` is set.
pub fn import(
    paths: &DeckPaths,
    input: &Path,
    overwrite: bool,
) -> Result<ImportOutcome, ImportError> {
    if !input.exists() {
        return Err(ImportError::NotFound(input.to_path_buf()));
    }
    let file = File::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ImportError::BadZip(err.to_string()))?;

    inspect_archive(&mut archive)?;

    let Some(manifest_raw) = read_entry(&mut archive, "manifest.json") else {
        return Err(ImportError::BadPackage(
            "package is missing manifest.json".to_string(),
        ));
    };
    let manifest: Value = serde_json::from_slice(&manifest_raw)
        .map_err(|err| ImportError::BadPackage(format!("manifest.json is not valid JSON: {err}")))?;
    validate_manifest(&manifest).map_err(ImportError::BadPackage)?;
    let created_by = manifest
        .get("created_by")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let names: Vec<String> = archive.file_names().map(ToOwned::to_owned).collect();
    let mut paper_entries: Vec<(String, String)> = Vec::new();
    for name in &names {
        let parts: Vec<&str> = name.split('/').collect();
        if parts.len() == 3 && parts[0] == "papers" && parts[2] == "metadata.json" {
            paper_entries.push((name.clone(), parts[1].to_string()));
        }
    }

    let mut index_record = index::load_or_default(paths);
    let mut outcome = ImportOutcome::default();
    let imported_at = now_iso();

    for (entry_name, raw_id) in paper_entries {
        let Some(id) = ArxivId::parse(&raw_id) else {
            warn!(paper = raw_id.as_str(), "skipping package entry with invalid arXiv ID");
            continue;
        };

        if index_record.papers.contains_key(id.as_str()) && !overwrite {
            info!(paper = id.as_str(), "paper already in collection, skipping");
            outcome.skipped += 1;
            continue;
        }

        let Some(bytes) = read_entry(&mut archive, &entry_name) else {
            warn!(paper = id.as_str(), "unreadable metadata entry, skipping");
            continue;
        };
        let mut record: PaperRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(err) => {
                warn!(paper = id.as_str(), "invalid metadata in package, skipping: {err}");
                continue;
            }
        };
        // The validated path component is authoritative for the stored ID.
        record.id = id.to_string();
        record.imported_at = Some(imported_at.clone());
        record.imported_from = Some(created_by.clone());
        atomic::write_json(&paths.metadata_file(&id), &record)?;

        if let Some(summary) = read_entry(&mut archive, &format!("papers/{id}/summary.md")) {
            if let Err(err) = fs::write(paths.summary_file(&id), &summary) {
                warn!(paper = id.as_str(), "failed to extract summary: {err}");
            }
        }

        let prefix = format!("papers/{id}/annotations/");
        for name in names.iter().filter(|n| n.starts_with(&prefix) && n.ends_with(".json")) {
            let file_name = name.rsplit('/').next().unwrap_or(name);
            let Some(bytes) = read_entry(&mut archive, name) else {
                warn!(paper = id.as_str(), "unreadable annotation entry, skipping");
                continue;
            };
            let dir = paths.annotations_dir(&id);
            let written = fs::create_dir_all(&dir).and_then(|()| fs::write(dir.join(file_name), &bytes));
            match written {
                Ok(()) => outcome.annotations += 1,
                Err(err) => {
                    warn!(paper = id.as_str(), "failed to extract annotation {file_name}: {err}");
                }
            }
        }

        index_record
            .papers
            .insert(id.to_string(), IndexEntry::from_record(&record));
        outcome.imported_ids.push(id.to_string());
        outcome.imported += 1;
    }

    index::save(paths, &mut index_record)?;
    info!(
        imported = outcome.imported,
        skipped = outcome.skipped,
        annotations = outcome.annotations,
        "package import complete"
    );
    Ok(outcome)
}

fn inspect_archive(archive: &mut ZipArchive<File>) -> Result<(), ImportError> {
    if archive.len() > MAX_ENTRY_COUNT {
        return Err(ImportError::BadPackage(format!(
            "too many files in package: {}",
            archive.len()
        )));
    }

    let mut total: u64 = 0;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|err| ImportError::BadZip(err.to_string()))?;
        let name = entry.name().to_string();
        if !is_safe_entry_path(&name) {
            return Err(ImportError::BadPackage(format!(
                "invalid path in package: {name}"
            )));
        }
        if entry.size() > MAX_ENTRY_BYTES {
            return Err(ImportError::BadPackage(format!(
                "package entry too large: {name}"
            )));
        }
        if entry.compressed_size() > 0 && entry.size() / entry.compressed_size() > MAX_COMPRESSION_RATIO
        {
            return Err(ImportError::BadPackage(format!(
                "suspicious compression ratio for package entry: {name}"
            )));
        }
        total = total.saturating_add(entry.size());
    }
    if total > MAX_TOTAL_BYTES {
        return Err(ImportError::BadPackage(format!(
            "package too large: {total} bytes uncompressed"
        )));
    }
    Ok(())
}

/// Entry names must stay relative and inside the archive root.
fn is_safe_entry_path(name: &str) -> bool {
    !(name.starts_with('/')
        || name.starts_with('\\')
        || name.contains("..")
        || name.contains(':'))
}

fn validate_manifest(manifest: &Value) -> Result<(), String> {
    for field in REQUIRED_MANIFEST_FIELDS {
        if manifest.get(field).is_none() {
            return Err(format!("manifest is missing required field: {field}"));
        }
    }
    if manifest
        .get("paper_count")
        .is_some_and(|v| v.as_u64().is_none())
    {
        return Err("manifest paper_count must be a non-negative integer".to_string());
    }
    Ok(())
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Option<Vec<u8>> {
    let mut entry = archive.by_name(name).ok()?;
    let mut buffer = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buffer).ok()?;
    Some(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::annotations;
    use crate::deck::model::AnnotationType;
    use crate::deck::papers;
    use tempfile::tempdir;

    fn seed(paths: &DeckPaths, index_record: &mut IndexRecord, id: &str, title: &str) -> ArxivId {
        let record = PaperRecord {
            id: id.to_string(),
            title: title.to_string(),
            abstract_text: "An abstract.".to_string(),
            collected_at: now_iso(),
            ..Default::default()
        };
        assert!(papers::create(paths, &record).expect("create paper"));
        index_record
            .papers
            .insert(id.to_string(), IndexEntry::from_record(&record));
        ArxivId::parse(id).expect("valid id")
    }

    fn share_all<'a>(username: &'a str) -> ShareRequest<'a> {
        ShareRequest {
            paper_ids: &[],
            include_summaries: true,
            include_annotations: true,
            username,
            description: None,
        }
    }

    fn write_package(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).expect("create zip");
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, body) in entries {
            zip.start_file(*name, options).expect("start entry");
            zip.write_all(body.as_bytes()).expect("write entry");
        }
        zip.finish().expect("finish zip");
    }

    fn manifest_body(paper_count: serde_json::Value) -> String {
        serde_json::json!({
            "version": MANIFEST_VERSION,
            "created_at": "2024-01-15T10:30:00+00:00",
            "created_by": "alice",
            "paper_count": paper_count,
            "includes_summaries": false,
            "includes_annotations": false,
            "description": ""
        })
        .to_string()
    }

    #[test]
    fn share_then_import_round_trips_between_collections() {
        let src = tempdir().expect("tempdir");
        let dst = tempdir().expect("tempdir");
        let src_paths = DeckPaths::new(src.path().join("data"));
        let dst_paths = DeckPaths::new(dst.path().join("data"));

        let mut index_record = IndexRecord::default();
        let first = seed(&src_paths, &mut index_record, "2401.11111", "Attention");
        seed(&src_paths, &mut index_record, "2401.22222", "Retrieval");
        fs::write(src_paths.summary_file(&first), "## Problem\nQuadratic cost.\n")
            .expect("write summary");
        annotations::save(&src_paths, &first, "why O(n^2)?", "alice", AnnotationType::Question)
            .expect("annotate");
        index::save(&src_paths, &mut index_record).expect("save index");

        let output = src.path().join("pkg.zip");
        let shared = share(&src_paths, &share_all("alice"), &output).expect("share");
        assert_eq!(shared.len(), 2);
        assert!(output.exists());

        let outcome = import(&dst_paths, &output, false).expect("import");
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.annotations, 1);

        let record = papers::load(&dst_paths, &first).expect("imported paper");
        assert_eq!(record.title, "Attention");
        assert_eq!(record.imported_from.as_deref(), Some("alice"));
        assert!(record.imported_at.is_some());
        assert!(dst_paths.summary_file(&first).exists());

        let dst_index = index::load(&dst_paths).expect("index");
        assert_eq!(dst_index.papers.len(), 2);
    }

    #[test]
    fn share_with_selection_only_packages_requested_papers() {
        let src = tempdir().expect("tempdir");
        let src_paths = DeckPaths::new(src.path().join("data"));

        let mut index_record = IndexRecord::default();
        let wanted = seed(&src_paths, &mut index_record, "2401.11111", "Attention");
        seed(&src_paths, &mut index_record, "2401.22222", "Retrieval");
        index::save(&src_paths, &mut index_record).expect("save index");

        let output = src.path().join("pkg.zip");
        let req = ShareRequest {
            paper_ids: std::slice::from_ref(&wanted),
            ..share_all("alice")
        };
        let shared = share(&src_paths, &req, &output).expect("share");
        assert_eq!(shared, vec!["2401.11111".to_string()]);
    }

    #[test]
    fn share_rejects_a_paper_outside_the_collection() {
        let src = tempdir().expect("tempdir");
        let src_paths = DeckPaths::new(src.path().join("data"));
        let mut index_record = IndexRecord::default();
        seed(&src_paths, &mut index_record, "2401.11111", "Attention");
        index::save(&src_paths, &mut index_record).expect("save index");

        let missing = ArxivId::parse("2401.99999").expect("valid id");
        let req = ShareRequest {
            paper_ids: std::slice::from_ref(&missing),
            ..share_all("alice")
        };
        let output = src.path().join("pkg.zip");
        assert!(matches!(
            share(&src_paths, &req, &output),
            Err(ShareError::PaperNotFound(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn empty_collection_shares_nothing_and_writes_no_archive() {
        let src = tempdir().expect("tempdir");
        let src_paths = DeckPaths::new(src.path().join("data"));
        index::save(&src_paths, &mut IndexRecord::default()).expect("save index");

        let output = src.path().join("pkg.zip");
        let shared = share(&src_paths, &share_all("alice"), &output).expect("share");
        assert!(shared.is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn import_skips_existing_papers_unless_overwrite() {
        let src = tempdir().expect("tempdir");
        let dst = tempdir().expect("tempdir");
        let src_paths = DeckPaths::new(src.path().join("data"));
        let dst_paths = DeckPaths::new(dst.path().join("data"));

        let mut index_record = IndexRecord::default();
        seed(&src_paths, &mut index_record, "2401.11111", "Attention");
        index::save(&src_paths, &mut index_record).expect("save index");

        let output = src.path().join("pkg.zip");
        share(&src_paths, &share_all("alice"), &output).expect("share");

        let first = import(&dst_paths, &output, false).expect("first import");
        assert_eq!(first.imported, 1);

        let second = import(&dst_paths, &output, false).expect("second import");
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 1);

        let forced = import(&dst_paths, &output, true).expect("overwrite import");
        assert_eq!(forced.imported, 1);
        assert_eq!(forced.skipped, 0);
    }

    #[test]
    fn missing_manifest_is_an_invalid_package() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path().join("data"));
        let pkg = tmp.path().join("pkg.zip");
        write_package(
            &pkg,
            &[("papers/2401.11111/metadata.json", r#"{"id": "2401.11111"}"#)],
        );

        let err = import(&paths, &pkg, false).expect_err("must fail");
        assert!(matches!(err, ImportError::BadPackage(_)));
        assert!(err.to_string().contains("manifest"));
    }

    #[test]
    fn manifest_missing_required_field_is_rejected() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path().join("data"));
        let pkg = tmp.path().join("pkg.zip");
        let manifest = r#"{"version": "1.0", "created_at": "2024-01-15T10:30:00+00:00"}"#;
        write_package(&pkg, &[("manifest.json", manifest)]);

        let err = import(&paths, &pkg, false).expect_err("must fail");
        assert!(err.to_string().contains("paper_count"));
    }

    #[test]
    fn manifest_paper_count_must_be_a_nonnegative_integer() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path().join("data"));
        let pkg = tmp.path().join("pkg.zip");
        write_package(
            &pkg,
            &[("manifest.json", &manifest_body(serde_json::json!(-1)))],
        );

        let err = import(&paths, &pkg, false).expect_err("must fail");
        assert!(err.to_string().contains("paper_count"));
    }

    #[test]
    fn hostile_entry_paths_are_rejected_before_extraction() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path().join("data"));
        let pkg = tmp.path().join("pkg.zip");
        write_package(
            &pkg,
            &[
                ("manifest.json", &manifest_body(serde_json::json!(1))),
                ("../evil.json", "{}"),
            ],
        );

        let err = import(&paths, &pkg, false).expect_err("must fail");
        assert!(matches!(err, ImportError::BadPackage(_)));
        assert!(err.to_string().contains("invalid path"));
        assert!(!paths.exists());
    }

    #[test]
    fn entries_with_invalid_ids_are_skipped() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path().join("data"));
        let pkg = tmp.path().join("pkg.zip");
        write_package(
            &pkg,
            &[
                ("manifest.json", &manifest_body(serde_json::json!(1))),
                ("papers/2401.12345v1/metadata.json", "{}"),
            ],
        );

        let outcome = import(&paths, &pkg, false).expect("import");
        assert_eq!(outcome.imported, 0);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn garbage_input_is_not_a_zip() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path().join("data"));
        let not_zip = tmp.path().join("pkg.zip");
        fs::write(&not_zip, "this is not an archive").expect("write");

        assert!(matches!(
            import(&paths, &not_zip, false),
            Err(ImportError::BadZip(_))
        ));
        assert!(matches!(
            import(&paths, &tmp.path().join("missing.zip"), false),
            Err(ImportError::NotFound(_))
        ));
    }

    #[test]
    fn compression_bombs_are_rejected() {
        let tmp = tempdir().expect("tempdir");
        let paths = DeckPaths::new(tmp.path().join("data"));
        let pkg = tmp.path().join("pkg.zip");
        let bomb = "0".repeat(5 * 1024 * 1024);
        write_package(
            &pkg,
            &[
                ("manifest.json", &manifest_body(serde_json::json!(1))),
                ("papers/2401.11111/metadata.json", &bomb),
            ],
        );

        let err = import(&paths, &pkg, false).expect_err("must fail");
        assert!(err.to_string().contains("compression ratio"));
    }

    #[test]
    fn safe_entry_paths_stay_relative() {
        assert!(is_safe_entry_path("papers/2401.11111/metadata.json"));
        assert!(!is_safe_entry_path("/etc/passwd"));
        assert!(!is_safe_entry_path("\\\\host\\share"));
        assert!(!is_safe_entry_path("papers/../escape.json"));
        assert!(!is_safe_entry_path("C:windows"));
    }
}
