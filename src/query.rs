use crate::dataset::SeriesDataset;
use crate::delta::per_second_points;
use crate::error::StoreError;
use crate::repository::SeriesRepository;
use crate::types::{Point, Series, Timestamp, Value};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable, self-contained read model of one dataset snapshot.
///
/// Unlike a [`SeriesDataset`], a view owns its points, so it is unaffected by later writes to
/// the dataset's buffer and can be cached or shipped to another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetView {
    pub series: String,
    pub instance: String,
    pub capacity: usize,
    pub points: Vec<Point>,
    /// Per-second rate towards each point after the first; empty for fewer than two points.
    pub per_second: Vec<Point>,
    pub observed_min: Value,
    pub observed_max: Value,
    pub observed_avg: i128,
    pub observed_values: u64,
    pub observed_value_changes: u64,
    pub stable_since: Timestamp,
    pub stable_count: u64,
}

impl From<&SeriesDataset> for DatasetView {
    fn from(set: &SeriesDataset) -> Self {
        let points = set.to_points();
        let per_second = if points.len() >= 2 {
            per_second_points(&points)
        } else {
            Vec::new()
        };
        DatasetView {
            series: set.series().to_string(),
            instance: set.instance().to_string(),
            capacity: set.capacity(),
            points,
            per_second,
            observed_min: set.observed_min(),
            observed_max: set.observed_max(),
            observed_avg: set.observed_avg(),
            observed_values: set.observed_values(),
            observed_value_changes: set.observed_value_changes(),
            stable_since: set.stable_since(),
            stable_count: set.stable_count(),
        }
    }
}

impl DatasetView {
    /// Encodes the view with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a view produced by [`DatasetView::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Builds views for a batch of snapshots in parallel, preserving order.
pub fn views(datasets: &[SeriesDataset]) -> Vec<DatasetView> {
    datasets.par_iter().map(DatasetView::from).collect()
}

/// One entry of a batch series request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesQuery {
    /// Series in textual form, e.g. `ns:jvm HeapUsage`.
    pub series: String,
    /// Restricts the result to these instances; all instances when `None`.
    pub instances: Option<Vec<String>>,
}

impl SeriesQuery {
    pub fn all(series: impl Into<String>) -> Self {
        SeriesQuery {
            series: series.into(),
            instances: None,
        }
    }

    pub fn on<S: Into<String>>(series: impl Into<String>, instances: impl IntoIterator<Item = S>) -> Self {
        SeriesQuery {
            series: series.into(),
            instances: Some(instances.into_iter().map(Into::into).collect()),
        }
    }
}

/// Executes a batch of series queries against the repository.
///
/// Results are keyed by the query's series text in order of first appearance; views of
/// repeated series are concatenated. A series text that does not parse yields an empty
/// result instead of failing the batch.
///
/// # Errors
/// Returns an error only if the repository lock is poisoned.
pub fn execute_queries(
    repository: &SeriesRepository,
    queries: &[SeriesQuery],
) -> Result<Vec<(String, Vec<DatasetView>)>, StoreError> {
    let mut results: Vec<(String, Vec<DatasetView>)> = Vec::new();
    for query in queries {
        let selected = match Series::parse(&query.series) {
            Ok(series) => match &query.instances {
                Some(instances) => repository.select_series_in(&series, instances)?,
                None => repository.select_series(&series)?,
            },
            Err(_) => Vec::new(),
        };
        let found = views(&selected);
        match results.iter_mut().find(|(key, _)| *key == query.series) {
            Some((_, existing)) => existing.extend(found),
            None => results.push((query.series.clone(), found)),
        }
    }
    Ok(results)
}
