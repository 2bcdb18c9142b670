use std::sync::Arc;

#[cfg(feature = "prometheus")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "prometheus")]
use std::sync::Mutex;
#[cfg(feature = "prometheus")]
use std::thread::JoinHandle;
#[cfg(feature = "prometheus")]
use std::time::Duration;

/// Structured, in-process event hook for observability.
///
/// This crate is a library; emitting logs directly (e.g. `println!`) is not acceptable for
/// production. Instead, callers can provide an implementation that forwards these events to
/// `tracing`, `log`, metrics, or custom sinks.
pub trait StoreEventListener: std::fmt::Debug + Send + Sync + 'static {
    fn on_event(&self, event: StoreEvent);
}

/// Structured events emitted by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    DatasetCreated { series: String, instance: String, capacity: usize },

    /// An add shifted the physical buffer of a dataset; snapshots taken before are outdated.
    BufferCompacted { series: String, instance: String, generation: u64 },

    SeriesLimitRejected { series: String, instance: String, limit: usize },
}

#[derive(Debug)]
pub struct NoopEventListener;

impl StoreEventListener for NoopEventListener {
    #[inline]
    fn on_event(&self, _event: StoreEvent) {}
}

pub fn noop_event_listener() -> Arc<dyn StoreEventListener> {
    Arc::new(NoopEventListener)
}

/// Metrics instrumentation of the series store.
///
/// Emitting metrics is effectively a no-op until a recorder is installed. With the
/// `prometheus` feature, [`InProcessPrometheus`](store_metrics::InProcessPrometheus) installs
/// one and renders the exposition text in-process.
pub mod store_metrics {
    #[cfg(feature = "prometheus")]
    use super::*;

    use ::metrics::{describe_counter, describe_gauge, Unit};

    #[cfg(feature = "prometheus")]
    use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

    // --- metric names ---
    //
    // Counters are exposed as `<name>_total` by the Prometheus exporter.

    pub const INGEST_POINTS: &str = "mcstore_ingest_points";
    pub const DATASETS: &str = "mcstore_datasets";
    pub const BUFFER_COMPACTIONS: &str = "mcstore_buffer_compactions";
    pub const SERIES_LIMIT_REJECTIONS: &str = "mcstore_series_limit_rejections";

    /// Handle to the in-process Prometheus recorder/scrape renderer.
    ///
    /// This does **not** start an HTTP server. Call [`InProcessPrometheus::render`] to scrape.
    #[cfg(feature = "prometheus")]
    #[derive(Debug)]
    pub struct InProcessPrometheus {
        handle: PrometheusHandle,
        stop: Arc<AtomicBool>,
        upkeep_thread: Mutex<Option<JoinHandle<()>>>,
    }

    #[cfg(feature = "prometheus")]
    impl InProcessPrometheus {
        /// Installs a global Prometheus recorder (once per process) and starts a small upkeep thread.
        pub fn install(upkeep_interval: Duration) -> Result<Self, MetricsInitError> {
            describe_all();

            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(MetricsInitError::from_build_error)?;

            let stop = Arc::new(AtomicBool::new(false));
            let stop_clone = stop.clone();
            let handle_clone = handle.clone();
            let upkeep_thread = std::thread::Builder::new()
                .name("mcstore-metrics-upkeep".to_string())
                .spawn(move || {
                    while !stop_clone.load(Ordering::Relaxed) {
                        std::thread::sleep(upkeep_interval);
                        handle_clone.run_upkeep();
                    }
                })
                .map_err(|e| MetricsInitError::ThreadSpawn(e.to_string()))?;

            Ok(Self {
                handle,
                stop,
                upkeep_thread: Mutex::new(Some(upkeep_thread)),
            })
        }

        /// Renders the current metrics in the Prometheus text exposition format.
        pub fn render(&self) -> String {
            self.handle.render()
        }
    }

    #[cfg(feature = "prometheus")]
    impl Drop for InProcessPrometheus {
        fn drop(&mut self) {
            self.stop.store(true, Ordering::Relaxed);
            if let Ok(mut guard) = self.upkeep_thread.lock() {
                if let Some(t) = guard.take() {
                    let _ = t.join();
                }
            }
        }
    }

    #[cfg(feature = "prometheus")]
    #[derive(Debug, thiserror::Error)]
    pub enum MetricsInitError {
        #[error("metrics recorder already installed")]
        AlreadyInstalled,
        #[error("failed to install prometheus recorder: {0}")]
        Install(String),
        #[error("failed to spawn upkeep thread: {0}")]
        ThreadSpawn(String),
    }

    #[cfg(feature = "prometheus")]
    impl MetricsInitError {
        fn from_build_error(e: BuildError) -> Self {
            match e {
                BuildError::FailedToSetGlobalRecorder(_) => MetricsInitError::AlreadyInstalled,
                other => MetricsInitError::Install(other.to_string()),
            }
        }
    }

    #[inline]
    pub fn record_ingest_point() {
        ::metrics::counter!(INGEST_POINTS).increment(1);
    }

    #[inline]
    pub fn record_datasets(datasets: usize) {
        ::metrics::gauge!(DATASETS).set(datasets as f64);
    }

    #[inline]
    pub fn record_buffer_compaction() {
        ::metrics::counter!(BUFFER_COMPACTIONS).increment(1);
    }

    #[inline]
    pub fn record_series_limit_rejection() {
        ::metrics::counter!(SERIES_LIMIT_REJECTIONS).increment(1);
    }

    /// Registers descriptions for all store metrics with the installed recorder.
    pub fn describe_all() {
        describe_counter!(
            INGEST_POINTS,
            Unit::Count,
            "Total number of observations added through SeriesRepository::add."
        );
        describe_counter!(
            BUFFER_COMPACTIONS,
            Unit::Count,
            "Number of physical buffer compactions (each outdates older snapshots)."
        );
        describe_counter!(
            SERIES_LIMIT_REJECTIONS,
            Unit::Count,
            "Observations rejected because the series limit was reached."
        );
        describe_gauge!(
            DATASETS,
            Unit::Count,
            "Number of (series, instance) datasets held by the repository."
        );
    }
}
