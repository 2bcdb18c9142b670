//! Cumulative statistics and run tracking, updated first on every add.

use crate::types::{Timestamp, Value};
use serde::{Deserialize, Serialize};

/// Statistics over every observation ever added to a dataset, not only the retained window.
///
/// `sum` is accumulated in 128 bits so that 64-bit values summed over any realistic number of
/// observations cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub count: u64,
    pub changes: u64,
    pub min: Value,
    pub max: Value,
    pub sum: i128,
}

impl AggregateStats {
    pub const EMPTY: AggregateStats = AggregateStats {
        count: 0,
        changes: 0,
        min: Value::MAX,
        max: Value::MIN,
        sum: 0,
    };

    #[inline]
    pub fn observe(&mut self, value: Value, is_change: bool) {
        if is_change {
            self.changes += 1;
        }
        self.count += 1;
        self.sum = self.sum.saturating_add(i128::from(value));
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Truncating average, `0` before the first observation.
    pub fn avg(&self) -> i128 {
        if self.count == 0 {
            return 0;
        }
        self.sum / i128::from(self.count)
    }
}

impl Default for AggregateStats {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Trailing run of identical consecutive values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTracker {
    /// Time of the first observation of the current run, `-1` before any observation.
    pub since: Timestamp,
    /// Number of observations in the current run.
    pub count: u64,
}

impl RunTracker {
    pub const EMPTY: RunTracker = RunTracker { since: -1, count: 0 };

    #[inline]
    pub fn observe(&mut self, time: Timestamp, is_change: bool) {
        if is_change {
            self.since = time;
            self.count = 1;
        } else {
            self.count += 1;
        }
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::EMPTY
    }
}
