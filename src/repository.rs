//! In-memory repository of the current dataset snapshot per `(series, instance)`.

use crate::dataset::SeriesDataset;
use crate::error::StoreError;
use crate::telemetry::{noop_event_listener, store_metrics, StoreEvent, StoreEventListener};
use crate::types::{Series, Timestamp, Value};

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// Default number of points retained per dataset (one minute at one observation per second).
pub const DEFAULT_CAPACITY: usize = 60;

/// Configuration options for the SeriesRepository
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of points retained per dataset
    pub capacity: usize,
    /// Optional hard limit on distinct `(series, instance)` datasets.
    pub max_series: Option<usize>,
    /// Structured event hook for observability (no-op by default).
    pub event_listener: Arc<dyn StoreEventListener>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            capacity: DEFAULT_CAPACITY,
            max_series: None,
            event_listener: noop_event_listener(),
        }
    }
}

type InstanceDatasets = HashMap<Arc<str>, SeriesDataset>;

#[derive(Debug, Default)]
struct Datasets {
    by_series: HashMap<Arc<Series>, InstanceDatasets>,
    /// Total number of datasets over all series.
    len: usize,
}

/// Collector-side store: threads each `(series, instance)` snapshot forward on ingestion and
/// hands out snapshots to readers.
///
/// Readers receive clones of the current snapshots; a clone shares the dataset's buffer and
/// stays valid while ingestion continues (see [`SeriesDataset::is_outdated`]).
#[derive(Debug)]
pub struct SeriesRepository {
    datasets: RwLock<Datasets>,
    config: StoreConfig,
}

impl SeriesRepository {
    /// Creates a repository with the provided configuration.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidConfiguration`] if the configured capacity is zero.
    pub fn with_config(config: StoreConfig) -> Result<Self, StoreError> {
        if config.capacity < 1 {
            return Err(StoreError::InvalidConfiguration {
                capacity: config.capacity,
            });
        }
        Ok(SeriesRepository {
            datasets: RwLock::new(Datasets::default()),
            config,
        })
    }

    /// Creates a repository with default configuration and the given per-dataset capacity.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidConfiguration`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        Self::with_config(StoreConfig {
            capacity,
            ..StoreConfig::default()
        })
    }

    /// Records an observation of `series` on `instance`.
    ///
    /// The dataset is created on first sight of the pair. Times must be non-decreasing per
    /// pair; this is not checked.
    ///
    /// # Errors
    /// Returns [`StoreError::SeriesLimitExceeded`] when a new pair would exceed
    /// `max_series`, or [`StoreError::LockError`] if the repository lock is poisoned.
    pub fn add(&self, series: &Series, instance: &str, time: Timestamp, value: Value) -> Result<(), StoreError> {
        let event = {
            let mut guard = self.datasets.write()?;
            let datasets = &mut *guard;

            if let Some(current) = datasets
                .by_series
                .get_mut(series)
                .and_then(|instances| instances.get_mut(instance))
            {
                *current = current.add(time, value);
                store_metrics::record_ingest_point();
                if current.compacted() {
                    store_metrics::record_buffer_compaction();
                    StoreEvent::BufferCompacted {
                        series: series.to_string(),
                        instance: instance.to_string(),
                        generation: current.buffer_generation(),
                    }
                } else {
                    return Ok(());
                }
            } else {
                if let Some(limit) = self.config.max_series {
                    if datasets.len >= limit {
                        let current = datasets.len;
                        drop(guard);
                        store_metrics::record_series_limit_rejection();
                        self.config.event_listener.on_event(StoreEvent::SeriesLimitRejected {
                            series: series.to_string(),
                            instance: instance.to_string(),
                            limit,
                        });
                        return Err(StoreError::SeriesLimitExceeded { current, limit });
                    }
                }

                let key = match datasets.by_series.get_key_value(series) {
                    Some((key, _)) => Arc::clone(key),
                    None => Arc::new(series.clone()),
                };
                let instance_key: Arc<str> = Arc::from(instance);
                let dataset = SeriesDataset::with_shared(
                    Arc::clone(&key),
                    Arc::clone(&instance_key),
                    self.config.capacity,
                )?
                .add(time, value);
                datasets
                    .by_series
                    .entry(key)
                    .or_default()
                    .insert(instance_key, dataset);
                datasets.len += 1;

                store_metrics::record_ingest_point();
                store_metrics::record_datasets(datasets.len);
                StoreEvent::DatasetCreated {
                    series: series.to_string(),
                    instance: instance.to_string(),
                    capacity: self.config.capacity,
                }
            }
        };
        self.config.event_listener.on_event(event);
        Ok(())
    }

    /// Current snapshot of `series` on `instance`, if any.
    pub fn get(&self, series: &Series, instance: &str) -> Result<Option<SeriesDataset>, StoreError> {
        let datasets = self.datasets.read()?;
        Ok(datasets
            .by_series
            .get(series)
            .and_then(|instances| instances.get(instance))
            .cloned())
    }

    /// Snapshots of `series` on all instances, ordered by instance.
    pub fn select_series(&self, series: &Series) -> Result<Vec<SeriesDataset>, StoreError> {
        let datasets = self.datasets.read()?;
        let mut selected: Vec<SeriesDataset> = datasets
            .by_series
            .get(series)
            .map(|instances| instances.values().cloned().collect())
            .unwrap_or_default();
        drop(datasets);
        selected.sort_by(|a, b| a.instance().cmp(b.instance()));
        Ok(selected)
    }

    /// Snapshots of `series` restricted to the given instances, ordered by instance.
    /// Unknown instances are skipped.
    pub fn select_series_in<S: AsRef<str>>(
        &self,
        series: &Series,
        instances: &[S],
    ) -> Result<Vec<SeriesDataset>, StoreError> {
        let datasets = self.datasets.read()?;
        let mut selected: Vec<SeriesDataset> = match datasets.by_series.get(series) {
            Some(by_instance) => instances
                .iter()
                .map(AsRef::as_ref)
                .collect::<BTreeSet<&str>>()
                .into_iter()
                .filter_map(|instance| by_instance.get(instance).cloned())
                .collect(),
            None => Vec::new(),
        };
        drop(datasets);
        selected.sort_by(|a, b| a.instance().cmp(b.instance()));
        Ok(selected)
    }

    /// Snapshots of every dataset, ordered by series text and instance.
    pub fn select_all_series(&self) -> Result<Vec<SeriesDataset>, StoreError> {
        let datasets = self.datasets.read()?;
        let mut selected: Vec<SeriesDataset> = datasets
            .by_series
            .values()
            .flat_map(|instances| instances.values().cloned())
            .collect();
        drop(datasets);
        selected.sort_by_cached_key(|set| (set.series().to_string(), set.instance().to_string()));
        Ok(selected)
    }

    /// Distinct series, ordered by their textual form.
    pub fn series(&self) -> Result<Vec<Series>, StoreError> {
        let datasets = self.datasets.read()?;
        let mut series: Vec<Series> = datasets.by_series.keys().map(|s| (**s).clone()).collect();
        drop(datasets);
        series.sort_by_cached_key(Series::to_string);
        Ok(series)
    }

    /// Distinct instances over all series, ordered.
    pub fn instances(&self) -> Result<Vec<String>, StoreError> {
        let datasets = self.datasets.read()?;
        let instances: BTreeSet<&str> = datasets
            .by_series
            .values()
            .flat_map(|by_instance| by_instance.keys().map(|k| &**k))
            .collect();
        Ok(instances.into_iter().map(str::to_string).collect())
    }

    /// Number of `(series, instance)` datasets.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.datasets.read()?.len)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Returns a reference to the repository configuration.
    pub fn get_config(&self) -> &StoreConfig {
        &self.config
    }
}
