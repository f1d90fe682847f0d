//! API Handlers
//!
//! HTTP request handlers for each service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    AggregateRequest, AggregateResponse, HealthResponse, ReportsQuery, ReportsResponse,
    StatsResponse,
};
use crate::pipeline::Pipeline;
use crate::remote::LogSource;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Same store the pipeline's memoizers write to
    pub cache: Arc<CacheStore>,
}

impl AppState {
    /// Creates a new AppState around an explicitly constructed store.
    pub fn new(source: Arc<dyn LogSource>, cache: Arc<CacheStore>, config: &Config) -> Self {
        let pipeline = Pipeline::new(source, Arc::clone(&cache), config);
        Self {
            pipeline: Arc::new(pipeline),
            cache,
        }
    }
}

/// Handler for GET /reports
///
/// Lists a guild's reports, optionally filtered by zone and start date.
pub async fn reports_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<ReportsResponse>> {
    let (guild, since) = query.validate().map_err(AppError::InvalidRequest)?;

    let reports = state
        .pipeline
        .list_reports(&guild, query.zone, since)
        .await?;

    Ok(Json(ReportsResponse {
        guild: guild.to_string(),
        reports,
    }))
}

/// Handler for POST /aggregate
///
/// Fetches, normalizes and aggregates the selected reports' logs.
pub async fn aggregate_handler(
    State(state): State<AppState>,
    Json(req): Json<AggregateRequest>,
) -> Result<Json<AggregateResponse>> {
    let view = req.validate().map_err(AppError::InvalidRequest)?;
    let classes = req.class_set();

    let outcome = state
        .pipeline
        .aggregate(&req.reports, view, req.encounter, classes.as_ref())
        .await;

    Ok(Json(AggregateResponse::new(view, req.encounter, outcome)))
}

/// Handler for GET /stats
///
/// Returns per-namespace cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.all_stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::remote::{GuildRef, LogRequest, ReportDescriptor};
    use async_trait::async_trait;

    struct StaticSource;

    #[async_trait]
    impl LogSource for StaticSource {
        async fn fetch_reports(&self, _guild: &GuildRef) -> std::result::Result<String, FetchError> {
            Ok(r#"[{"id": "r1", "title": "Naxx", "zone": 1006, "start": 0, "end": 60000}]"#
                .to_string())
        }

        async fn fetch_log(&self, _request: &LogRequest) -> std::result::Result<String, FetchError> {
            Ok(r#"{"entries": [{"name": "A", "type": "Hunter", "total": 75},
                               {"name": "B", "type": "Shaman", "total": 25}]}"#
                .to_string())
        }
    }

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(StaticSource),
            Arc::new(CacheStore::new(100)),
            &Config::default(),
        )
    }

    fn query(guild: &str) -> ReportsQuery {
        ReportsQuery {
            guild: guild.to_string(),
            server: "Gehennas".to_string(),
            region: "EU".to_string(),
            zone: None,
            since: None,
        }
    }

    #[tokio::test]
    async fn test_reports_handler() {
        let result = reports_handler(State(test_state()), Query(query("Ony"))).await;

        let response = result.unwrap();
        assert_eq!(response.reports.len(), 1);
        assert_eq!(response.reports[0].id, "r1");
    }

    #[tokio::test]
    async fn test_reports_handler_rejects_blank_guild() {
        let result = reports_handler(State(test_state()), Query(query("  "))).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_aggregate_handler() {
        let req = AggregateRequest {
            reports: vec![ReportDescriptor {
                id: "r1".to_string(),
                title: "Naxx".to_string(),
                zone: 1006,
                start: 0,
                end: 60_000,
                owner: None,
            }],
            view: "healing".to_string(),
            encounter: 0,
            classes: None,
        };

        let response = aggregate_handler(State(test_state()), Json(req)).await.unwrap();

        assert_eq!(response.entities.len(), 2);
        assert_eq!(response.entities[0].name, "B");
        assert_eq!(response.entities[1].mean, 75.0);
    }

    #[tokio::test]
    async fn test_stats_handler_lists_namespaces() {
        let response = stats_handler(State(test_state())).await;
        assert_eq!(response.namespaces.len(), 2);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
