use reqwest::header::HeaderMap;

use crate::{OddsApiError, QuotaUsage};

pub const HEADER_REQUESTS_REMAINING: &str = "x-requests-remaining";
pub const HEADER_REQUESTS_USED: &str = "x-requests-used";
pub const HEADER_REQUESTS_LAST: &str = "x-requests-last";

/// The provider reports scores as strings. Some sports report fractional values ("1.0"), so a trailing `.0` is
/// accepted.
pub fn parse_score(score: &str) -> Result<i32, OddsApiError> {
    let trimmed = score.trim();
    let whole = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    whole.parse::<i32>().map_err(|e| OddsApiError::InvalidScore(format!("'{score}'. {e}")))
}

/// Extracts the quota headers. Missing or malformed headers are reported as `None`.
pub fn quota_from_headers(headers: &HeaderMap) -> QuotaUsage {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            // Remaining/used counts are sometimes sent as floats, e.g. "499.0"
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    };
    QuotaUsage {
        requests_remaining: read(HEADER_REQUESTS_REMAINING),
        requests_used: read(HEADER_REQUESTS_USED),
        requests_last: read(HEADER_REQUESTS_LAST),
    }
}
