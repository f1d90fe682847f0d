//! Response DTOs for the service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::analysis::{class_color, AggregateRow};
use crate::cache::CacheStats;
use crate::pipeline::{AggregateOutcome, SkippedLog};
use crate::remote::{ReportDescriptor, View};

/// Response body for `GET /reports`
#[derive(Debug, Clone, Serialize)]
pub struct ReportsResponse {
    pub guild: String,
    pub reports: Vec<ReportDescriptor>,
}

/// One ranked entity, ready to draw
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntity {
    pub name: String,
    pub class: String,
    pub mean: f64,
    pub std: Option<f64>,
    pub count: usize,
    pub color: &'static str,
}

impl From<AggregateRow> for RankedEntity {
    fn from(row: AggregateRow) -> Self {
        Self {
            color: class_color(&row.entity_class),
            name: row.entity_name,
            class: row.entity_class,
            mean: row.mean,
            std: row.std,
            count: row.count,
        }
    }
}

/// Response body for `POST /aggregate`
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResponse {
    pub title: String,
    pub view: View,
    pub encounter: i64,
    /// Ascending by mean
    pub entities: Vec<RankedEntity>,
    pub logs_requested: usize,
    pub logs_used: usize,
    pub skipped: Vec<SkippedLog>,
    pub all_failed: bool,
}

impl AggregateResponse {
    pub fn new(view: View, encounter: i64, outcome: AggregateOutcome) -> Self {
        Self {
            title: format!("Percentage of total {}", view),
            view,
            encounter,
            entities: outcome.rows.into_iter().map(RankedEntity::from).collect(),
            logs_requested: outcome.logs_requested,
            logs_used: outcome.logs_used,
            skipped: outcome.skipped,
            all_failed: outcome.all_failed,
        }
    }
}

/// Counters of one cache namespace
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStatsResponse {
    pub namespace: String,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub namespaces: Vec<NamespaceStatsResponse>,
}

impl StatsResponse {
    pub fn new(stats: Vec<(String, CacheStats)>) -> Self {
        Self {
            namespaces: stats
                .into_iter()
                .map(|(namespace, stats)| NamespaceStatsResponse {
                    namespace,
                    hit_rate: stats.hit_rate(),
                    stats,
                })
                .collect(),
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
