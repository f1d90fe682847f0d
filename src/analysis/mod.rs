//! Analysis Module
//!
//! Pure transformations from raw log tables to the ranked aggregate table.
//! No shared state, safe to run on any thread.

mod aggregate;
mod classes;
mod normalize;

pub use aggregate::{aggregate, filter_classes, relevance_filter, AggregateRow, Aggregator};
pub use classes::{class_color, UNKNOWN_CLASS_COLOR};
pub use normalize::{normalize_log, NormalizedRow, NON_PLAYER_TYPE};
