//! Pipeline Orchestrator
//!
//! Sequences memoized fetch, normalization and aggregation for a batch of
//! logs. Per-log failures are skipped, never raised.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::analysis::{normalize_log, AggregateRow, Aggregator};
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::FetchError;
use crate::memo::{memoize, Memoizer};
use crate::remote::{
    filter_reports, parse_log_response, parse_reports, GuildRef, LogRequest, LogSource,
    ReportDescriptor, View,
};

/// Cache namespace of report listings
pub const REPORTS_NAMESPACE: &str = "reports";

/// Cache namespace of log tables
pub const LOGS_NAMESPACE: &str = "logs";

/// A log left out of an aggregation, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLog {
    pub log_id: String,
    pub reason: String,
}

/// Result of aggregating a batch of logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateOutcome {
    /// Ranked rows, ascending by mean
    pub rows: Vec<AggregateRow>,
    pub logs_requested: usize,
    pub logs_used: usize,
    pub skipped: Vec<SkippedLog>,
    /// Logs were requested and none of them could be used
    pub all_failed: bool,
}

// == Pipeline ==
/// Fetch via memoizers, normalize, aggregate.
pub struct Pipeline {
    reports: Memoizer<GuildRef, Vec<ReportDescriptor>>,
    logs: Memoizer<LogRequest, Value>,
    aggregator: Aggregator,
}

impl Pipeline {
    /// Wires `source` through memoizers on `store` configured by `config`.
    pub fn new(source: Arc<dyn LogSource>, store: Arc<CacheStore>, config: &Config) -> Self {
        let listing_source = Arc::clone(&source);
        let reports = memoize(
            Arc::clone(&store),
            REPORTS_NAMESPACE,
            config.reports.ttl(),
            config.reports.limit,
            move |guild: GuildRef| {
                let source = Arc::clone(&listing_source);
                async move {
                    let raw = source.fetch_reports(&guild).await?;
                    parse_reports(&raw)
                }
            },
        )
        .with_timeout(config.fetch_timeout());

        let log_source = source;
        let logs = memoize(
            store,
            LOGS_NAMESPACE,
            config.logs.ttl(),
            config.logs.limit,
            move |request: LogRequest| {
                let source = Arc::clone(&log_source);
                async move {
                    let raw = source.fetch_log(&request).await?;
                    parse_log_response(&raw)
                }
            },
        )
        .with_timeout(config.fetch_timeout());

        Self {
            reports,
            logs,
            aggregator: Aggregator::new(config.relevance_threshold),
        }
    }

    // == List Reports ==
    /// Lists the reports of `guild`, filtered by zone and start date.
    ///
    /// A malformed listing yields an empty list; other fetch failures are
    /// returned.
    pub async fn list_reports(
        &self,
        guild: &GuildRef,
        zone: Option<i64>,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ReportDescriptor>, FetchError> {
        info!("Fetching reports for {}", guild);
        let started = Instant::now();

        let reports = match self.reports.call(guild.clone()).await {
            Ok(reports) => reports,
            Err(FetchError::Malformed(msg)) => {
                error!("Report listing for {} is malformed: {}", guild, msg);
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        info!(
            "Done. Fetching reports took {:?}, {} listed",
            started.elapsed(),
            reports.len()
        );
        Ok(filter_reports(reports, zone, since))
    }

    // == Aggregate ==
    /// Aggregates the `view` tables of `reports` for `encounter`.
    ///
    /// Logs that fail to fetch or normalize are skipped and listed in the
    /// outcome. `classes`, if given and non-empty, restricts the rows.
    pub async fn aggregate(
        &self,
        reports: &[ReportDescriptor],
        view: View,
        encounter: i64,
        classes: Option<&HashSet<String>>,
    ) -> AggregateOutcome {
        let mut rows = Vec::new();
        let mut skipped = Vec::new();
        let mut logs_used = 0;

        info!("Fetching {} logs..", reports.len());
        let started = Instant::now();

        for report in reports {
            let request = LogRequest::for_report(report, view, encounter);
            if self.logs.key_exists(&request) {
                info!(
                    "{} log for encounter {} with log_id {} already fetched",
                    view, encounter, report.id
                );
            }

            let normalized = match self.logs.call(request).await {
                Ok(body) => normalize_log(&body).map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };

            match normalized {
                Ok(log_rows) => {
                    logs_used += 1;
                    rows.extend(log_rows);
                }
                Err(reason) => {
                    warn!("Skipping log {}: {}", report.id, reason);
                    skipped.push(SkippedLog {
                        log_id: report.id.clone(),
                        reason,
                    });
                }
            }
        }
        info!("Done. Fetching logs took {:?}", started.elapsed());

        let started = Instant::now();
        let rows = self.aggregator.run(rows, classes);
        info!("Done. Aggregating logs took {:?}", started.elapsed());

        let all_failed = !reports.is_empty() && logs_used == 0;
        if all_failed {
            error!("Every one of {} logs failed", reports.len());
        }

        AggregateOutcome {
            rows,
            logs_requested: reports.len(),
            logs_used,
            skipped,
            all_failed,
        }
    }
}
