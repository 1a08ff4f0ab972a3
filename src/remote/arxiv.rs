use crate::deck::config::ArxivApiConfig;
use crate::remote::{backoff_secs, pause};
use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration as StdDuration;
use tracing::{info, warn};

static ID_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}\.\d{4,5})").expect("id extraction pattern is valid"));

static TOPIC_CLEANER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("topic cleaner pattern is valid"));

/// One paper as returned by the arXiv Atom feed, before it is stored and
/// gains collection metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FetchedPaper {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub published: String,
    pub updated: String,
    pub categories: Vec<String>,
    pub pdf_url: String,
}

pub struct ArxivClient {
    http: reqwest::blocking::Client,
    cfg: ArxivApiConfig,
}

impl ArxivClient {
    pub fn new(cfg: ArxivApiConfig, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(StdDuration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, cfg })
    }

    /// `all:<topic> AND submittedDate:[start TO end]`, dates as YYYYMMDD.
    /// Characters outside `\w` and whitespace are stripped from the topic so
    /// user input cannot break the query syntax.
    pub fn build_query(topic: &str, days: u32) -> String {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days));
        let clean_topic = TOPIC_CLEANER.replace_all(topic, "");
        format!(
            "all:{clean_topic} AND submittedDate:[{} TO {}]",
            start.format("%Y%m%d"),
            end.format("%Y%m%d")
        )
    }

    /// Query arXiv for papers matching `topic` submitted in the last `days`
    /// days, newest first. Retries with exponential backoff; a pacing sleep
    /// follows every successful request.
    pub fn fetch(&self, topic: &str, days: u32, max: u64) -> Result<Vec<FetchedPaper>> {
        let query = Self::build_query(topic, days);
        let max_results = max.min(self.cfg.max_results);
        let attempts = self.cfg.max_retries;

        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..attempts {
            info!(attempt = attempt + 1, attempts, query = query.as_str(), "querying arXiv");
            match self.request(&query, max_results) {
                Ok(body) => {
                    pause(self.cfg.request_delay_secs);
                    return Ok(parse_atom(&body));
                }
                Err(err) => {
                    if attempt + 1 < attempts {
                        let delay =
                            backoff_secs(self.cfg.request_delay_secs, self.cfg.backoff_factor, attempt as u32);
                        warn!(
                            attempt = attempt + 1,
                            attempts,
                            delay_secs = delay,
                            "arXiv request failed: {err:#}"
                        );
                        pause(delay);
                    }
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("arXiv fetch failed with no attempts made")))
    }

    fn request(&self, query: &str, max_results: u64) -> Result<String> {
        let response = self
            .http
            .get(&self.cfg.base_url)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", &max_results.to_string()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .context("arXiv request failed")?
            .error_for_status()
            .context("arXiv returned an error status")?;
        response.text().context("failed to read arXiv response")
    }
}

fn normalize_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn date_prefix(raw: &str) -> String {
    raw.chars().take(10).collect()
}

/// Parse the arXiv Atom feed. Entries whose `<id>` URL carries no
/// recognizable arXiv identifier are skipped with a warning.
pub fn parse_atom(xml: &str) -> Vec<FetchedPaper> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers: Vec<FetchedPaper> = Vec::new();
    let mut current: Option<FetchedPaper> = None;
    let mut entry_url = String::new();
    let mut in_id = false;
    let mut in_title = false;
    let mut in_summary = false;
    let mut in_name = false;
    let mut in_published = false;
    let mut in_updated = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"entry" => {
                    current = Some(FetchedPaper::default());
                    entry_url.clear();
                }
                b"id" if current.is_some() => in_id = true,
                b"title" if current.is_some() => in_title = true,
                b"summary" => in_summary = true,
                b"name" => in_name = true,
                b"published" => in_published = true,
                b"updated" if current.is_some() => in_updated = true,
                b"category" => {
                    if let Some(paper) = current.as_mut() {
                        push_category(paper, e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"category" {
                    if let Some(paper) = current.as_mut() {
                        push_category(paper, e);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(paper) = current.as_mut() {
                    if in_id {
                        entry_url.push_str(&text);
                    } else if in_title {
                        if !paper.title.is_empty() {
                            paper.title.push(' ');
                        }
                        paper.title.push_str(&text);
                    } else if in_summary {
                        if !paper.abstract_text.is_empty() {
                            paper.abstract_text.push(' ');
                        }
                        paper.abstract_text.push_str(&text);
                    } else if in_name {
                        paper.authors.push(normalize_ws(&text));
                    } else if in_published {
                        paper.published = date_prefix(&text);
                    } else if in_updated {
                        paper.updated = date_prefix(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"id" => in_id = false,
                b"title" => in_title = false,
                b"summary" => in_summary = false,
                b"name" => in_name = false,
                b"published" => in_published = false,
                b"updated" => in_updated = false,
                b"entry" => {
                    if let Some(mut paper) = current.take() {
                        if let Some(found) = ID_IN_URL.captures(&entry_url) {
                            paper.id = found[1].to_string();
                            paper.title = normalize_ws(&paper.title);
                            paper.abstract_text = normalize_ws(&paper.abstract_text);
                            paper.pdf_url = format!("https://arxiv.org/pdf/{}.pdf", paper.id);
                            papers.push(paper);
                        } else {
                            warn!(url = entry_url.as_str(), "could not extract arXiv ID, skipping entry");
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!("Atom parse error: {err}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    papers
}

fn push_category(paper: &mut FetchedPaper, e: &quick_xml::events::BytesStart<'_>) {
    if let Ok(Some(term)) = e.try_get_attribute("term") {
        if let Ok(value) = term.unescape_value() {
            paper.categories.push(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <id>http://arxiv.org/api/feedid</id>
  <entry>
    <id>http://arxiv.org/abs/2401.12345v1</id>
    <title>Attention Is
 All You Need</title>
    <summary>We propose a new
 architecture.</summary>
    <published>2024-01-15T18:00:00Z</published>
    <updated>2024-01-16T09:00:00Z</updated>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <category term="cs.CL"/>
    <category term="cs.LG"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/not-a-paper</id>
    <title>Broken entry</title>
    <summary>No usable ID.</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_and_skips_unidentifiable_ones() {
        let papers = parse_atom(SAMPLE_FEED);
        assert_eq!(papers.len(), 1);

        let paper = &papers[0];
        assert_eq!(paper.id, "2401.12345");
        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(paper.abstract_text, "We propose a new architecture.");
        assert_eq!(paper.authors, ["Ada Lovelace", "Alan Turing"]);
        assert_eq!(paper.categories, ["cs.CL", "cs.LG"]);
        assert_eq!(paper.published, "2024-01-15");
        assert_eq!(paper.updated, "2024-01-16");
        assert_eq!(paper.pdf_url, "https://arxiv.org/pdf/2401.12345.pdf");
    }

    #[test]
    fn query_strips_special_characters_and_dates_the_range() {
        let query = ArxivClient::build_query("LLM agents: a survey!", 7);
        assert!(query.starts_with("all:LLM agents a survey AND submittedDate:["));
        assert!(query.ends_with("]"));
        assert!(query.contains(" TO "));
    }

    #[test]
    fn feed_level_title_is_not_an_entry() {
        let feed = r#"<feed><title>Results</title><id>http://arxiv.org/api/x</id></feed>"#;
        assert!(parse_atom(feed).is_empty());
    }
}
