//! Request DTOs for the service API
//!
//! Defines the structure of incoming query strings and request bodies.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::remote::{GuildRef, ReportDescriptor, View};

/// Query string for `GET /reports`
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsQuery {
    pub guild: String,
    pub server: String,
    pub region: String,
    /// Only reports in this zone
    #[serde(default)]
    pub zone: Option<i64>,
    /// Only reports starting on or after this `YYYY-MM-DD` date
    #[serde(default)]
    pub since: Option<String>,
}

impl ReportsQuery {
    /// Validates the query, returning the guild and parsed date.
    pub fn validate(&self) -> Result<(GuildRef, Option<NaiveDate>), String> {
        for (field, value) in [
            ("guild", &self.guild),
            ("server", &self.server),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} cannot be empty", field));
            }
        }

        let since = match &self.since {
            Some(date) => Some(
                NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|_| format!("since must be YYYY-MM-DD, got '{}'", date))?,
            ),
            None => None,
        };

        Ok((
            GuildRef::new(&self.guild, &self.server, &self.region),
            since,
        ))
    }
}

/// Request body for `POST /aggregate`
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateRequest {
    pub reports: Vec<ReportDescriptor>,
    pub view: String,
    #[serde(default)]
    pub encounter: i64,
    /// Only keep entities of these classes
    #[serde(default)]
    pub classes: Option<Vec<String>>,
}

impl AggregateRequest {
    /// Validates the request, returning the parsed view.
    pub fn validate(&self) -> Result<View, String> {
        if self.reports.is_empty() {
            return Err("At least one report is required".to_string());
        }
        self.view.parse()
    }

    pub fn class_set(&self) -> Option<HashSet<String>> {
        self.classes
            .as_ref()
            .map(|classes| classes.iter().cloned().collect())
    }
}
