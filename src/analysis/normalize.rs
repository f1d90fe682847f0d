//! Log Normalizer
//!
//! Turns one raw log table into per-entity rows expressed as a percentage
//! of that log's total.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LogError;

/// Entry type of non-player contributors
pub const NON_PLAYER_TYPE: &str = "Pet";

/// One contributor's share of a single log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub entity_name: String,
    pub entity_class: String,
    /// Percentage of the log's summed `total`
    pub value: f64,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    total: f64,
}

/// Normalizes one log response.
///
/// Every usable entry's `total` is divided by the sum over all usable
/// entries of this log, pets included, then pets are dropped. Entries
/// lacking `name`, `type` or a numeric `total` are skipped. A log whose
/// totals sum to zero yields no rows.
pub fn normalize_log(raw: &Value) -> Result<Vec<NormalizedRow>, LogError> {
    let entries = raw
        .get("entries")
        .and_then(Value::as_array)
        .ok_or(LogError::MissingEntries)?;

    let parsed: Vec<RawEntry> = entries
        .iter()
        .filter_map(|entry| match RawEntry::deserialize(entry) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                debug!("Skipping unusable log entry: {}", err);
                None
            }
        })
        .collect();

    let sum: f64 = parsed.iter().map(|entry| entry.total).sum();
    if sum == 0.0 || !sum.is_finite() {
        warn!("Log totals sum to {}, nothing to normalize", sum);
        return Ok(Vec::new());
    }

    Ok(parsed
        .into_iter()
        .filter(|entry| entry.kind != NON_PLAYER_TYPE)
        .map(|entry| NormalizedRow {
            entity_name: entry.name,
            entity_class: entry.kind,
            value: 100.0 * entry.total / sum,
        })
        .collect())
}
