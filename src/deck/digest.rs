use crate::deck::arxiv_id;
use crate::deck::model::{IndexEntry, IndexRecord};
use crate::deck::papers;
use crate::deck::paths::DeckPaths;
use crate::deck::util::parse_iso;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{info, warn};

pub const DEFAULT_TIMESPAN: &str = "1w";
pub const SNIPPET_CHARS: usize = 200;
const UNCATEGORIZED_TOPIC: &str = "Uncategorized";

static TIMESPAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([hdwm])$").expect("timespan pattern is valid"));

static PROBLEM_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)## Problem\s*\n(.+?)(?:\n##|\z)").expect("problem section pattern is valid")
});

/// Parse a lookback window like `24h`, `7d`, `2w`, `1m` (months ≈ 30 days).
pub fn parse_timespan(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim().to_lowercase();
    let caps = TIMESPAN_PATTERN.captures(&raw).ok_or_else(|| {
        format!("invalid timespan format: '{raw}' (use forms like 24h, 1d, 7d, 2w, 1m)")
    })?;
    let value: i64 = caps[1]
        .parse()
        .map_err(|_| format!("timespan value out of range: '{raw}'"))?;
    if value <= 0 {
        return Err("timespan value must be positive".to_string());
    }
    let duration = match &caps[2] {
        "h" => Duration::hours(value),
        "d" => Duration::days(value),
        "w" => Duration::weeks(value),
        "m" => Duration::days(value * 30),
        _ => unreachable!("pattern restricts the unit"),
    };
    Ok(duration)
}

/// Papers collected within `[since, until]`, newest first.
pub fn filter_by_date(
    index: &IndexRecord,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Vec<(String, IndexEntry)> {
    let mut out: Vec<(String, IndexEntry)> = Vec::new();
    for (id, entry) in &index.papers {
        if !arxiv_id::is_valid(id) {
            warn!(paper = id.as_str(), "skipping paper with invalid ID");
            continue;
        }
        let Some(collected_at) = parse_iso(&entry.collected_at) else {
            warn!(paper = id.as_str(), "invalid collected_at timestamp");
            continue;
        };
        if collected_at >= since && collected_at <= until {
            out.push((id.clone(), entry.clone()));
        }
    }
    out.sort_by(|a, b| b.1.collected_at.cmp(&a.1.collected_at));
    info!(papers = out.len(), "filtered papers in date range");
    out
}

/// Group papers by topic. Papers without topics fall back to arXiv
/// categories from full metadata, then to "Uncategorized" (listed last);
/// a paper with several topics appears in each group.
pub fn group_by_topic(
    papers_in_range: &[(String, IndexEntry)],
    paths: &DeckPaths,
) -> Vec<(String, Vec<(String, IndexEntry)>)> {
    let mut groups: BTreeMap<String, Vec<(String, IndexEntry)>> = BTreeMap::new();

    for (id, entry) in papers_in_range {
        let mut topics = entry.topics.clone();
        if topics.is_empty() {
            if let Some(record) = papers::load_raw(paths, id) {
                topics = if record.topics.is_empty() {
                    record.categories
                } else {
                    record.topics
                };
            }
        }
        if topics.is_empty() {
            topics = vec![UNCATEGORIZED_TOPIC.to_string()];
        }
        for topic in topics {
            groups
                .entry(topic)
                .or_default()
                .push((id.clone(), entry.clone()));
        }
    }

    let uncategorized = groups.remove(UNCATEGORIZED_TOPIC);
    let mut out: Vec<(String, Vec<(String, IndexEntry)>)> = groups.into_iter().collect();
    if let Some(papers) = uncategorized {
        out.push((UNCATEGORIZED_TOPIC.to_string(), papers));
    }
    out
}

fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    let cut = head.rfind(' ').unwrap_or(head.len());
    format!("{}...", &head[..cut])
}

/// Pull a short snippet out of a generated summary: the `## Problem`
/// section when present, otherwise the first non-header paragraph.
pub fn extract_snippet(summary: &str) -> String {
    if summary.is_empty() {
        return String::new();
    }

    if let Some(caps) = PROBLEM_SECTION.captures(summary) {
        return truncate_at_word(caps[1].trim(), SNIPPET_CHARS);
    }

    let mut content_lines: Vec<&str> = Vec::new();
    let mut length = 0usize;
    for line in summary.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("**") {
            continue;
        }
        length += line.chars().count() + 1;
        content_lines.push(line);
        if length >= SNIPPET_CHARS {
            break;
        }
    }
    truncate_at_word(&content_lines.join(" "), SNIPPET_CHARS)
}

/// Render the digest markdown document.
pub fn render(
    grouped: &[(String, Vec<(String, IndexEntry)>)],
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    paths: &DeckPaths,
) -> String {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut with_summary = 0usize;
    for (_, papers_in_topic) in grouped {
        for (id, entry) in papers_in_topic {
            if seen.insert(id) && entry.has_summary {
                with_summary += 1;
            }
        }
    }
    let total = seen.len();

    let mut lines: Vec<String> = Vec::new();
    lines.push("# Research Paper Digest".to_string());
    lines.push(String::new());
    lines.push(format!("**Generated:** {}", until.format("%Y-%m-%d")));
    lines.push(format!(
        "**Period:** {} to {}",
        since.format("%Y-%m-%d"),
        until.format("%Y-%m-%d")
    ));
    lines.push(format!("**Papers:** {total} ({with_summary} with summaries)"));
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());

    if grouped.is_empty() {
        lines.push("*No papers collected in this time period.*".to_string());
        lines.push(String::new());
    }

    for (topic, papers_in_topic) in grouped {
        lines.push(format!("## {topic}"));
        lines.push(String::new());

        for (id, entry) in papers_in_topic {
            let mut authors = entry.authors.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
            if entry.authors.len() > 3 {
                authors.push_str(" et al.");
            }

            lines.push(format!("### [{id}] {}", entry.title));
            lines.push(format!("**Authors:** {authors}"));
            if let Some(published) =
                papers::load_raw(paths, id).and_then(|record| record.published)
            {
                lines.push(format!("**Published:** {published}"));
            }
            lines.push(String::new());

            if entry.has_summary {
                if let Some(summary) = papers::load_summary_raw(paths, id) {
                    let snippet = extract_snippet(&summary);
                    if !snippet.is_empty() {
                        lines.push(format!("> {snippet}"));
                        lines.push(String::new());
                    }
                }
                lines.push(format!("[View Full Summary](../papers/{id}/summary.md)"));
            } else {
                if !entry.abstract_text.is_empty() {
                    lines.push(format!(
                        "> {}",
                        truncate_at_word(&entry.abstract_text, SNIPPET_CHARS)
                    ));
                    lines.push(String::new());
                }
                lines.push("*Summary not available*".to_string());
            }
            lines.push(String::new());
        }

        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.push("*Generated by paperdeck*".to_string());
    lines.push(String::new());
    lines.join("\n")
}
