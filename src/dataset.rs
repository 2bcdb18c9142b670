//! Immutable dataset snapshots of one series on one instance.

use crate::error::StoreError;
use crate::stats::{AggregateStats, RunTracker};
use crate::types::{Point, Series, Timestamp, Value};
use crate::window::Window;
use std::sync::Arc;

/// One immutable snapshot of the recent observations of a `(series, instance)` pair.
///
/// Every [`add`](SeriesDataset::add) returns a new snapshot and leaves `self` logically
/// unchanged. Successive snapshots share one physical buffer; once a later add compacts that
/// buffer, the snapshot it returns and all older ones report
/// [`is_outdated`](SeriesDataset::is_outdated).
///
/// Retention rules on add, with `T = 2 * capacity - 1`:
/// * a changed value, or the first repeat of a value, is pushed (evicting the oldest point
///   when the window is full);
/// * further repeats move the time of the most recent point forward;
/// * once a run has `T` or more observations the window collapses to the run's first and
///   latest point.
#[derive(Debug, Clone)]
pub struct SeriesDataset {
    series: Arc<Series>,
    instance: Arc<str>,
    capacity: usize,
    window: Window,
    run: RunTracker,
    stats: AggregateStats,
}

impl SeriesDataset {
    /// Creates an empty dataset retaining at most `capacity` points.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidConfiguration`] when `capacity` is zero.
    pub fn new(series: Series, instance: impl Into<Arc<str>>, capacity: usize) -> Result<Self, StoreError> {
        Self::with_shared(Arc::new(series), instance.into(), capacity)
    }

    pub(crate) fn with_shared(series: Arc<Series>, instance: Arc<str>, capacity: usize) -> Result<Self, StoreError> {
        if capacity < 1 {
            return Err(StoreError::InvalidConfiguration { capacity });
        }
        Ok(SeriesDataset {
            series,
            instance,
            capacity,
            window: Window::new(capacity),
            run: RunTracker::EMPTY,
            stats: AggregateStats::EMPTY,
        })
    }

    /// Returns the snapshot after observing `value` at `time`.
    ///
    /// `time` must not be before the time of the previous observation; this is not checked.
    pub fn add(&self, time: Timestamp, value: Value) -> SeriesDataset {
        let point = Point::new(time, value);
        let is_change = self.window.last().map_or(true, |last| last.value != value);

        let mut run = self.run;
        run.observe(time, is_change);
        let mut stats = self.stats;
        stats.observe(value, is_change);

        let window = if is_change || run.count == 2 {
            self.window.push(point, self.capacity)
        } else if run.count >= self.collapse_threshold() && self.capacity >= 2 {
            self.window.collapse(Point::new(run.since, value), point)
        } else {
            self.window.merge(point)
        };

        SeriesDataset {
            series: Arc::clone(&self.series),
            instance: Arc::clone(&self.instance),
            capacity: self.capacity,
            window,
            run,
            stats,
        }
    }

    /// Run length from which the window collapses to a two-point flat segment.
    #[inline]
    fn collapse_threshold(&self) -> u64 {
        2 * self.capacity as u64 - 1
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Number of retained points.
    pub fn size(&self) -> usize {
        self.window.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained points flattened as `[t0, v0, t1, v1, ...]`, copied out of the shared buffer.
    pub fn points(&self) -> Vec<i64> {
        self.window
            .points()
            .into_iter()
            .flat_map(|p| [p.time, p.value])
            .collect()
    }

    /// Retained points, oldest first, copied out of the shared buffer.
    pub fn to_points(&self) -> Vec<Point> {
        self.window.points()
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.window.get(index)
    }

    /// Time of the oldest retained point, `-1` when empty.
    pub fn first_time(&self) -> Timestamp {
        self.window.first().map_or(-1, |p| p.time)
    }

    /// Time of the most recent point, `-1` when empty.
    pub fn last_time(&self) -> Timestamp {
        self.window.last().map_or(-1, |p| p.time)
    }

    /// Value of the most recent point, `0` when empty.
    pub fn last_value(&self) -> Value {
        self.window.last().map_or(0, |p| p.value)
    }

    /// True once an add recycled the buffer slots this snapshot was created against. The
    /// snapshot returned by the compacting add is itself outdated.
    ///
    /// Purely advisory: caches holding snapshots use it to decide when to refresh.
    pub fn is_outdated(&self) -> bool {
        self.window.is_outdated()
    }

    pub(crate) fn buffer_generation(&self) -> u64 {
        self.window.buffer_generation()
    }

    /// True if the add that produced this snapshot compacted the buffer it appended to.
    pub(crate) fn compacted(&self) -> bool {
        self.window.compacted()
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn observed_min(&self) -> Value {
        self.stats.min
    }

    pub fn observed_max(&self) -> Value {
        self.stats.max
    }

    /// Truncated average of all observations ever added, `0` when none.
    pub fn observed_avg(&self) -> i128 {
        self.stats.avg()
    }

    /// Number of observations ever added.
    pub fn observed_values(&self) -> u64 {
        self.stats.count
    }

    /// Number of observations that differed from their predecessor (the first counts).
    pub fn observed_value_changes(&self) -> u64 {
        self.stats.changes
    }

    /// Time at which the current run of identical values started.
    pub fn stable_since(&self) -> Timestamp {
        self.run.since
    }

    /// Number of observations in the current run of identical values.
    pub fn stable_count(&self) -> u64 {
        self.run.count
    }
}
