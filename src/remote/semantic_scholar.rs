use crate::deck::arxiv_id::{self, ArxivId};
use crate::deck::config::SemanticScholarConfig;
use crate::remote::{backoff_secs, pause};
use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

const FIELDS: &str = "references,citations,citationCount,referenceCount,externalIds";

/// Raw citation answer for one paper, arXiv IDs already extracted but not
/// yet filtered to the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationAnswer {
    pub citation_count: u64,
    pub reference_count: u64,
    pub reference_ids: Vec<String>,
    pub citation_ids: Vec<String>,
}

pub struct SemanticScholarClient {
    http: reqwest::blocking::Client,
    cfg: SemanticScholarConfig,
}

impl SemanticScholarClient {
    pub fn new(cfg: SemanticScholarConfig, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(StdDuration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, cfg })
    }

    /// Fetch citation data for one paper. `Ok(None)` means the paper is
    /// unknown upstream (HTTP 404); a 429 waits out the rate limit window
    /// and retries. Each rate-limit wait consumes an attempt.
    pub fn fetch(&self, id: &ArxivId) -> Result<Option<CitationAnswer>> {
        let url = format!("{}/paper/arXiv:{}", self.cfg.base_url, id);
        let attempts = self.cfg.max_retries;

        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..attempts {
            debug!(paper = id.as_str(), attempt = attempt + 1, attempts, "fetching citations");
            let response = match self
                .http
                .get(&url)
                .query(&[("fields", FIELDS)])
                .send()
            {
                Ok(response) => response,
                Err(err) => {
                    let err = anyhow::Error::from(err).context("Semantic Scholar request failed");
                    if attempt + 1 < attempts {
                        let delay = backoff_secs(
                            self.cfg.request_delay_secs,
                            self.cfg.backoff_factor,
                            attempt as u32,
                        );
                        warn!(paper = id.as_str(), delay_secs = delay, "request failed: {err:#}");
                        pause(delay);
                    }
                    last_err = Some(err);
                    continue;
                }
            };

            if response.status() == StatusCode::NOT_FOUND {
                info!(paper = id.as_str(), "paper not found in Semantic Scholar");
                return Ok(None);
            }
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                warn!(
                    wait_secs = self.cfg.rate_limit_wait_secs,
                    "rate limited by Semantic Scholar"
                );
                pause(self.cfg.rate_limit_wait_secs as f64);
                continue;
            }

            match response
                .error_for_status()
                .context("Semantic Scholar returned an error status")
                .and_then(|ok| ok.json::<Value>().context("invalid Semantic Scholar JSON"))
            {
                Ok(body) => {
                    pause(self.cfg.request_delay_secs);
                    return Ok(Some(parse_answer(&body)));
                }
                Err(err) => {
                    if attempt + 1 < attempts {
                        let delay = backoff_secs(
                            self.cfg.request_delay_secs,
                            self.cfg.backoff_factor,
                            attempt as u32,
                        );
                        warn!(paper = id.as_str(), delay_secs = delay, "request failed: {err:#}");
                        pause(delay);
                    }
                    last_err = Some(err);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| anyhow!("Semantic Scholar rate limit persisted across all attempts")))
    }
}

fn parse_answer(body: &Value) -> CitationAnswer {
    CitationAnswer {
        citation_count: body["citationCount"].as_u64().unwrap_or(0),
        reference_count: body["referenceCount"].as_u64().unwrap_or(0),
        reference_ids: extract_arxiv_ids(&body["references"]),
        citation_ids: extract_arxiv_ids(&body["citations"]),
    }
}

/// Pull validated arXiv IDs out of a list of S2 paper objects via their
/// `externalIds.ArXiv` field. Anything malformed is dropped.
fn extract_arxiv_ids(papers: &Value) -> Vec<String> {
    let Some(list) = papers.as_array() else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|paper| paper["externalIds"]["ArXiv"].as_str())
        .filter(|raw| arxiv_id::is_valid(raw))
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_only_valid_arxiv_ids() {
        let papers = json!([
            {"externalIds": {"ArXiv": "2401.00001"}},
            {"externalIds": {"ArXiv": "../2401.00002"}},
            {"externalIds": {"DOI": "10.1000/x"}},
            {"externalIds": null},
            {"externalIds": {"ArXiv": "2310.1234"}}
        ]);
        assert_eq!(extract_arxiv_ids(&papers), ["2401.00001", "2310.1234"]);
    }

    #[test]
    fn missing_lists_yield_empty_answer() {
        let answer = parse_answer(&json!({"citationCount": 7}));
        assert_eq!(answer.citation_count, 7);
        assert_eq!(answer.reference_count, 0);
        assert!(answer.reference_ids.is_empty());
        assert!(answer.citation_ids.is_empty());
    }

    #[test]
    fn counts_parse_from_full_body() {
        let body = json!({
            "citationCount": 3,
            "referenceCount": 12,
            "references": [{"externalIds": {"ArXiv": "2401.00001"}}],
            "citations": []
        });
        let answer = parse_answer(&body);
        assert_eq!(answer.reference_count, 12);
        assert_eq!(answer.reference_ids, ["2401.00001"]);
    }
}
