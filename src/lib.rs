#![doc = include_str!("../README.md")]
// Declare modules
mod buffer;
pub mod dataset;
pub mod delta;
pub mod error;
pub mod query;
pub mod repository;
pub mod settings;
pub mod stats;
pub mod telemetry;
pub mod types;
mod window;

/// Immutable snapshot of the recent observations of one series on one instance.
pub use crate::dataset::SeriesDataset;
/// Per-second rate of change between consecutive points.
pub use crate::delta::{per_second, per_second_points};
/// Error type for store operations.
pub use crate::error::StoreError;
/// Serializable read model of a snapshot and batch series queries.
pub use crate::query::{execute_queries, DatasetView, SeriesQuery};
/// Main entry point for ingesting and selecting datasets.
pub use crate::repository::SeriesRepository;
/// Configuration options for the repository.
pub use crate::repository::{StoreConfig, DEFAULT_CAPACITY};
/// Loads a [`StoreConfig`] from file and environment.
pub use crate::settings::load_config;
/// Lossless cumulative statistics and run tracking.
pub use crate::stats::{AggregateStats, RunTracker};
/// Structured event hook for observability.
pub use crate::telemetry::{StoreEvent, StoreEventListener};
/// A single observation.
pub use crate::types::Point;
/// Identity of a metric stream.
pub use crate::types::Series;
/// Type alias for the ordered tags of a series.
pub use crate::types::TagSet;
/// Type alias for a timestamp (milliseconds since epoch).
pub use crate::types::Timestamp;
/// Type alias for an observed value (i64).
pub use crate::types::Value;
