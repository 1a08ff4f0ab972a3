use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Return the current time as an ISO-8601 / RFC 3339 string.
///
/// This is the single, canonical timestamp format used across metadata,
/// the index, annotations, and citation data.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a stored ISO-8601 timestamp, tolerating both offset-carrying and
/// naive values (naive values are assumed to be UTC).
pub fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

/// Round a relevance score to two decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_naive_timestamps() {
        assert!(parse_iso("2024-01-15T10:30:00+00:00").is_some());
        assert!(parse_iso("2024-01-15T10:30:00.123456").is_some());
        assert!(parse_iso("").is_none());
        assert!(parse_iso("not a date").is_none());
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(7.5), 7.5);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(1.0 / 3.0), 0.33);
    }
}
