//! Remote Module
//!
//! Boundary to the remote combat-log API: the [`LogSource`] trait the
//! pipeline fetches through, its reqwest implementation, and parsers for
//! the raw bodies it returns.

mod client;
mod reports;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub use client::{parse_log_response, WclClient};
pub use reports::{filter_reports, parse_reports, ReportDescriptor};

/// Source of raw report listings and log tables.
///
/// Implementations own transport, timeouts and any retry policy. Bodies are
/// returned unparsed.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetches the raw report listing of a guild.
    async fn fetch_reports(&self, guild: &GuildRef) -> Result<String, FetchError>;

    /// Fetches the raw table of one log.
    async fn fetch_log(&self, request: &LogRequest) -> Result<String, FetchError>;
}

/// A guild on a realm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildRef {
    pub guild: String,
    pub server: String,
    pub region: String,
}

impl GuildRef {
    pub fn new(
        guild: impl Into<String>,
        server: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            guild: guild.into(),
            server: server.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for GuildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>-<{}>-<{}>", self.guild, self.server, self.region)
    }
}

/// Metric a log table is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    DamageDone,
    Healing,
    DamageTaken,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::DamageDone => "damage-done",
            View::Healing => "healing",
            View::DamageTaken => "damage-taken",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "damage-done" => Ok(View::DamageDone),
            "healing" => Ok(View::Healing),
            "damage-taken" => Ok(View::DamageTaken),
            other => Err(format!("Unknown view '{}'", other)),
        }
    }
}

/// Arguments identifying one log table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRequest {
    pub view: View,
    pub log_id: String,
    /// Length of the window to cover, in milliseconds from report start
    pub end: i64,
    pub encounter: i64,
}

impl LogRequest {
    /// Request covering the whole of `report`.
    pub fn for_report(report: &ReportDescriptor, view: View, encounter: i64) -> Self {
        Self {
            view,
            log_id: report.id.clone(),
            end: report.duration_ms(),
            encounter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_display() {
        let guild = GuildRef::new("Inheritance", "Razorgore", "EU");
        assert_eq!(guild.to_string(), "<Inheritance>-<Razorgore>-<EU>");
    }

    #[test]
    fn test_view_parse_and_serialize() {
        assert_eq!("healing".parse::<View>(), Ok(View::Healing));
        assert!("threat".parse::<View>().is_err());
        assert_eq!(
            serde_json::to_string(&View::DamageDone).unwrap(),
            r#""damage-done""#
        );
    }

    #[test]
    fn test_log_request_for_report() {
        let report = ReportDescriptor {
            id: "abc".to_string(),
            title: "mc alt run".to_string(),
            zone: 1000,
            start: 1_590_000_000_000,
            end: 1_590_000_360_000,
            owner: None,
        };

        let request = LogRequest::for_report(&report, View::DamageDone, 663);
        assert_eq!(request.log_id, "abc");
        assert_eq!(request.end, 360_000);
        assert_eq!(request.encounter, 663);
    }
}
