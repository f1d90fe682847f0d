//! Raid Meter - cached fetch and aggregation of combat-log tables
//!
//! Fetches report listings and per-log tables from a rate-limited remote
//! API through a namespaced TTL/LRU cache with single-flight population,
//! normalizes each log to percentages of its total, and aggregates many
//! logs into one ranked per-entity table.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use pipeline::{AggregateOutcome, Pipeline};
pub use tasks::spawn_cleanup_task;
