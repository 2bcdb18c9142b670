use thiserror::Error;

/// Custom error type for the series store.
///
/// Ingestion into a [`SeriesDataset`](crate::SeriesDataset) never fails; the variants below
/// are reported at setup time or by the repository and configuration layers around it.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A dataset must retain at least one point.
    #[error("Invalid configuration: capacity must be at least 1, got {capacity}")]
    InvalidConfiguration { capacity: usize },

    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// Distinct `(series, instance)` limit of the repository exceeded.
    #[error("Series limit exceeded: current={current}, limit={limit}")]
    SeriesLimitExceeded {
        /// Datasets currently held by the repository.
        current: usize,
        /// Configured hard limit.
        limit: usize,
    },

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),
}

// Implement conversion from lock poison errors for convenience
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        StoreError::LockError(format!("Mutex/RwLock poisoned: {}", err))
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::ConfigError(err.to_string())
    }
}
