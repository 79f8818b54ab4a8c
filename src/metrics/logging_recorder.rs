//! A metrics recorder that periodically logs all captured metrics.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, Instrument};

/// A metrics recorder that logs a snapshot of every counter and gauge through
/// `tracing` once per interval.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    /// Creates a new `LoggingRecorder` and starts the task that logs snapshots
    /// until `shutdown_rx` flips to `true`.
    pub fn new(interval: Duration, mut shutdown_rx: watch::Receiver<bool>) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        let recorder = Self {
            registry: registry.clone(),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut previous = HashMap::new();
            let mut last_snapshot = Instant::now();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        log_snapshot(&registry, &mut previous, last_snapshot.elapsed());
                        last_snapshot = Instant::now();
                    }
                    _ = shutdown_rx.wait_for(|stop| *stop) => {
                        log_snapshot(&registry, &mut previous, last_snapshot.elapsed());
                        info!("Metrics logging task received shutdown signal.");
                        break;
                    }
                }
            }
        }
        .in_current_span());

        (recorder, handle)
    }
}

/// Renders a key as `name` or `name{label=value,...}`.
fn display_key(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

/// Logs every counter with its growth since the previous snapshot, then every gauge.
fn log_snapshot(
    registry: &Registry<Key, AtomicStorage>,
    previous: &mut HashMap<Key, u64>,
    elapsed: Duration,
) {
    debug!("--- Metrics Snapshot ---");

    for (key, counter) in registry.get_counter_handles() {
        let value = counter.load(Ordering::Relaxed);
        let last = previous.insert(key.clone(), value).unwrap_or(0);
        info!(
            "[Counter] {}: {} (+{} in the last {:.1}s)",
            display_key(&key),
            value,
            value.saturating_sub(last),
            elapsed.as_secs_f64()
        );
    }

    for (key, gauge) in registry.get_gauge_handles() {
        let value = f64::from_bits(gauge.load(Ordering::Relaxed));
        info!("[Gauge] {}: {}", display_key(&key), value as u64);
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}
