//! Layered configuration for [`StoreConfig`]: defaults, an optional TOML file, then
//! `MCSTORE_*` environment variables.

use crate::error::StoreError;
use crate::repository::StoreConfig;
use crate::telemetry::noop_event_listener;

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Partial config as read from file and environment. Every field is optional; unset fields
/// keep the [`StoreConfig`] default.
#[derive(Debug, Default, Deserialize)]
pub struct StoreFileConfig {
    pub capacity: Option<usize>,
    pub max_series: Option<usize>,
}

/// Loads the store configuration.
///
/// Environment variables override the file, e.g. `MCSTORE_CAPACITY=120` or
/// `MCSTORE_MAX_SERIES=10000`. The event listener is always the no-op listener; callers that
/// want events set their own on the returned config.
///
/// # Errors
/// Returns [`StoreError::ConfigError`] if `path` is given but does not exist or cannot be
/// parsed, and [`StoreError::InvalidConfiguration`] for a zero capacity.
pub fn load_config(path: Option<&Path>) -> Result<StoreConfig, StoreError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(StoreError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("MCSTORE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .ignore_empty(true),
    );

    let partial: StoreFileConfig = builder.build()?.try_deserialize()?;

    let mut store_config = StoreConfig {
        event_listener: noop_event_listener(),
        ..StoreConfig::default()
    };
    merge_into_store_config(&mut store_config, &partial)?;
    Ok(store_config)
}

/// Merges a partial config onto `base`. Only overwrites fields that are `Some`.
pub fn merge_into_store_config(base: &mut StoreConfig, partial: &StoreFileConfig) -> Result<(), StoreError> {
    if let Some(capacity) = partial.capacity {
        if capacity < 1 {
            return Err(StoreError::InvalidConfiguration { capacity });
        }
        base.capacity = capacity;
    }
    if let Some(n) = partial.max_series {
        base.max_series = Some(n);
    }
    Ok(())
}
