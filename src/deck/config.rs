use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/paperdeck_env_allowlist.rs"));
}

pub const ARXIV_MAX_RESULTS_CAP: u64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivApiConfig {
    pub base_url: String,
    pub max_results: u64,
    pub request_delay_secs: f64,
    pub max_retries: u64,
    pub backoff_factor: f64,
}

impl Default for ArxivApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org/api/query".to_string(),
            max_results: ARXIV_MAX_RESULTS_CAP,
            request_delay_secs: 3.0,
            max_retries: 3,
            backoff_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticScholarConfig {
    pub base_url: String,
    pub request_delay_secs: f64,
    pub max_retries: u64,
    pub backoff_factor: f64,
    pub rate_limit_wait_secs: u64,
}

impl Default for SemanticScholarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            request_delay_secs: 3.0,
            max_retries: 3,
            backoff_factor: 2.0,
            rate_limit_wait_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckConfig {
    pub data_dir: String,
    pub http_timeout_secs: u64,
    pub arxiv: ArxivApiConfig,
    pub semantic_scholar: SemanticScholarConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            http_timeout_secs: 30,
            arxiv: ArxivApiConfig::default(),
            semantic_scholar: SemanticScholarConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PartialDeckConfig {
    data_dir: Option<String>,
    http_timeout_secs: Option<u64>,
    arxiv: Option<ArxivApiConfig>,
    semantic_scholar: Option<SemanticScholarConfig>,
}

fn env_or_f64(var: &str, fallback: f64) -> f64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<f64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &DeckConfig) -> Result<()> {
    if cfg.data_dir.trim().is_empty() {
        return Err(anyhow!("invalid data dir: cannot be empty"));
    }
    if cfg.http_timeout_secs == 0 {
        return Err(anyhow!("invalid http timeout: must be >= 1 second"));
    }
    if cfg.arxiv.max_results == 0 || cfg.arxiv.max_results > ARXIV_MAX_RESULTS_CAP {
        return Err(anyhow!(
            "invalid arxiv max results: require 1..={ARXIV_MAX_RESULTS_CAP}"
        ));
    }
    if cfg.arxiv.max_retries == 0 || cfg.semantic_scholar.max_retries == 0 {
        return Err(anyhow!("invalid retry count: must be >= 1"));
    }
    if !(cfg.arxiv.backoff_factor >= 1.0) || !(cfg.semantic_scholar.backoff_factor >= 1.0) {
        return Err(anyhow!("invalid backoff factor: must be >= 1.0"));
    }
    if cfg.arxiv.request_delay_secs < 0.0 || cfg.semantic_scholar.request_delay_secs < 0.0 {
        return Err(anyhow!("invalid request delay: must be >= 0"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("PAPERDECK_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let base = dirs::config_dir()?;
    Some(base.join("paperdeck").join("config.toml"))
}

fn merge_file_config(base: &mut DeckConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialDeckConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(data_dir) = parsed.data_dir {
        base.data_dir = data_dir;
    }
    if let Some(timeout) = parsed.http_timeout_secs {
        base.http_timeout_secs = timeout;
    }
    if let Some(arxiv) = parsed.arxiv {
        base.arxiv = arxiv;
    }
    if let Some(semantic_scholar) = parsed.semantic_scholar {
        base.semantic_scholar = semantic_scholar;
    }
    Ok(())
}

/// Flag `PAPERDECK_*` variables that nothing in the binary reads. Typos in
/// an env override would otherwise be silently ignored.
fn warn_unknown_env_vars() {
    for (key, _) in env::vars() {
        if !key.starts_with("PAPERDECK_") {
            continue;
        }
        if !generated::GENERATED_ENV_ALLOWLIST.contains(&key.as_str()) {
            warn!(var = key.as_str(), "unknown PAPERDECK_ environment variable");
        }
    }
}

/// Defaults, then the optional TOML file, then `PAPERDECK_*` env overrides.
pub fn load_config() -> Result<DeckConfig> {
    warn_unknown_env_vars();

    let mut cfg = DeckConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.data_dir = env_or_string("PAPERDECK_DATA_DIR", &cfg.data_dir);
    cfg.http_timeout_secs = env_or_u64("PAPERDECK_HTTP_TIMEOUT_SECS", cfg.http_timeout_secs);
    cfg.arxiv.base_url = env_or_string("PAPERDECK_ARXIV_BASE_URL", &cfg.arxiv.base_url);
    cfg.arxiv.max_results = env_or_u64("PAPERDECK_ARXIV_MAX_RESULTS", cfg.arxiv.max_results);
    cfg.arxiv.request_delay_secs = env_or_f64(
        "PAPERDECK_ARXIV_REQUEST_DELAY_SECS",
        cfg.arxiv.request_delay_secs,
    );
    cfg.arxiv.max_retries = env_or_u64("PAPERDECK_ARXIV_MAX_RETRIES", cfg.arxiv.max_retries);
    cfg.semantic_scholar.base_url =
        env_or_string("PAPERDECK_S2_BASE_URL", &cfg.semantic_scholar.base_url);
    cfg.semantic_scholar.request_delay_secs = env_or_f64(
        "PAPERDECK_S2_REQUEST_DELAY_SECS",
        cfg.semantic_scholar.request_delay_secs,
    );
    cfg.semantic_scholar.max_retries = env_or_u64(
        "PAPERDECK_S2_MAX_RETRIES",
        cfg.semantic_scholar.max_retries,
    );
    cfg.semantic_scholar.rate_limit_wait_secs = env_or_u64(
        "PAPERDECK_S2_RATE_LIMIT_WAIT_SECS",
        cfg.semantic_scholar.rate_limit_wait_secs,
    );

    validate(&cfg)?;
    Ok(cfg)
}
