//! Aggregator
//!
//! Folds normalized rows from any number of logs into one ranked table of
//! per-entity mean, standard deviation and sample count.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::analysis::NormalizedRow;
use crate::config::DEFAULT_RELEVANCE_THRESHOLD;

/// One entity's statistics across a batch of logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub entity_name: String,
    pub entity_class: String,
    /// Mean of the distinct values contributed
    pub mean: f64,
    /// Sample standard deviation of the distinct values, `None` below two
    pub std: Option<f64>,
    /// Number of rows contributed, duplicates included
    pub count: usize,
}

#[derive(Default)]
struct Group {
    class: String,
    distinct: Vec<f64>,
    seen: HashSet<u64>,
    count: usize,
}

impl Group {
    fn add(&mut self, row: NormalizedRow) {
        // -0.0 and 0.0 are the same value
        let value = if row.value == 0.0 { 0.0 } else { row.value };
        if self.seen.insert(value.to_bits()) {
            self.distinct.push(value);
        }
        self.count += 1;
        self.class = row.entity_class;
    }
}

/// Groups rows by entity and computes mean, std and count.
///
/// Identical values from the same entity count once towards mean and std
/// but every row counts towards `count`. The result is sorted ascending by
/// mean, ties by name.
pub fn aggregate<I>(rows: I) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = NormalizedRow>,
{
    let mut groups: HashMap<String, Group> = HashMap::new();
    for row in rows {
        groups.entry(row.entity_name.clone()).or_default().add(row);
    }

    let mut result: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(entity_name, group)| AggregateRow {
            entity_name,
            entity_class: group.class,
            mean: mean(&group.distinct),
            std: sample_std(&group.distinct),
            count: group.count,
        })
        .collect();

    result.sort_by(|a, b| {
        a.mean
            .total_cmp(&b.mean)
            .then_with(|| a.entity_name.cmp(&b.entity_name))
    });
    result
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values);
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

/// Drops rows whose mean is at most `threshold` times the largest mean.
pub fn relevance_filter(rows: Vec<AggregateRow>, threshold: f64) -> Vec<AggregateRow> {
    let Some(max) = rows.iter().map(|row| row.mean).max_by(f64::total_cmp) else {
        return rows;
    };
    let cutoff = max * threshold;

    rows.into_iter().filter(|row| row.mean > cutoff).collect()
}

/// Keeps only rows whose class is in `classes`.
pub fn filter_classes(rows: Vec<AggregateRow>, classes: &HashSet<String>) -> Vec<AggregateRow> {
    rows.into_iter()
        .filter(|row| classes.contains(&row.entity_class))
        .collect()
}

// == Aggregator ==
/// Aggregation with the class and relevance filters applied.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    threshold: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_RELEVANCE_THRESHOLD)
    }
}

impl Aggregator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Aggregates `rows`, keeps `classes` if given, then drops negligible
    /// contributors relative to the top remaining mean.
    pub fn run<I>(&self, rows: I, classes: Option<&HashSet<String>>) -> Vec<AggregateRow>
    where
        I: IntoIterator<Item = NormalizedRow>,
    {
        let mut table = aggregate(rows);
        if let Some(classes) = classes.filter(|c| !c.is_empty()) {
            table = filter_classes(table, classes);
        }

        info!(
            "Removing entities with mean at or below {} of max",
            self.threshold
        );
        relevance_filter(table, self.threshold)
    }
}
