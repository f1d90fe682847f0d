//! Report Listing Parser
//!
//! Turns a raw guild report listing into report descriptors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::FetchError;

const ALL_ZONES: i64 = -1;

/// One uploaded report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    pub id: String,
    pub title: String,
    pub zone: i64,
    /// Unix milliseconds
    pub start: i64,
    /// Unix milliseconds
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ReportDescriptor {
    /// Length of the report window, 0 when `end` precedes `start`.
    pub fn duration_ms(&self) -> i64 {
        self.end.saturating_sub(self.start).max(0)
    }
}

/// Parses a raw listing body.
///
/// The body must be a JSON array; items that are not report objects are
/// skipped. Anything else is [`FetchError::Malformed`].
pub fn parse_reports(raw: &str) -> Result<Vec<ReportDescriptor>, FetchError> {
    let body: Value = serde_json::from_str(raw)
        .map_err(|err| FetchError::Malformed(format!("{}: '{}'", err, excerpt(raw))))?;

    let items = match body {
        Value::Array(items) => items,
        other => {
            let status = other.get("status").and_then(Value::as_u64);
            return Err(FetchError::Malformed(format!(
                "expected a report list, got status {:?}: {}",
                status,
                excerpt(&other.to_string())
            )));
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!("Skipping unusable report entry: {}", err);
                None
            }
        })
        .collect())
}

/// Keeps reports in `zone` (all zones if `None`) starting on or after `since`.
pub fn filter_reports(
    reports: Vec<ReportDescriptor>,
    zone: Option<i64>,
    since: Option<NaiveDate>,
) -> Vec<ReportDescriptor> {
    let since_ms = since.map(day_start_ms);
    // -1 is the remote API's "all zones"
    let zone = zone.filter(|zone| *zone != ALL_ZONES);

    reports
        .into_iter()
        .filter(|report| zone.map_or(true, |zone| report.zone == zone))
        .filter(|report| since_ms.map_or(true, |since| report.start >= since))
        .collect()
}

/// Unix milliseconds at UTC midnight of `date`.
fn day_start_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// First part of a payload, for log lines.
pub(crate) fn excerpt(raw: &str) -> String {
    const MAX: usize = 200;
    match raw.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}
