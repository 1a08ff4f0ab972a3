use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Canonical arXiv identifier shape: `YYMM.NNNNN` or `YYMM.NNNN`, digits only.
///
/// IDs are interpolated directly into filesystem paths, so this pattern is the
/// sole defense against path traversal. Anything else — `..`, separators,
/// version suffixes like `v1` — must be rejected.
static ARXIV_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\.\d{4,5}$").expect("arXiv ID pattern is valid"));

pub fn is_valid(raw: &str) -> bool {
    ARXIV_ID_PATTERN.is_match(raw)
}

/// A validated arXiv paper ID.
///
/// The only way to construct one is through `parse`, so any `ArxivId` held by
/// the store layer is safe to use as a path component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ArxivId(String);

impl ArxivId {
    pub fn parse(raw: &str) -> Option<Self> {
        if is_valid(raw) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArxivId {
    type Err = InvalidArxivId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidArxivId(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ArxivId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ArxivId::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid arXiv ID: {raw}")))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid arXiv ID format: {0} (expected YYMM.NNNNN, e.g. 2401.12345)")]
pub struct InvalidArxivId(pub String);
