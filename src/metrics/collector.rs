//! Metrics collection and registry.

use crate::gather::GatherStats;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("metrics output is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Prometheus metrics registry for entropy gathering.
pub struct MetricsRegistry {
    registry: Registry,

    // Request metrics
    requests_total: IntCounter,
    bytes_total: IntCounter,
    reads_total: IntCounter,
    zero_reads_total: IntCounter,

    // Retry metrics
    timeouts_total: IntCounter,
    wait_errors_total: IntCounter,
    interrupted_reads_total: IntCounter,
    bogus_reads_total: IntCounter,
    notices_total: IntCounter,

    // Device metrics
    device_opens_total: IntCounter,
    fatal_errors_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all gather metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| -> Result<IntCounter, MetricsError> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        Ok(Self {
            requests_total: counter(
                "os_entropy_gather_requests_total",
                "Total number of successful gather calls",
            )?,
            bytes_total: counter(
                "os_entropy_gather_bytes_total",
                "Total random bytes delivered to callers",
            )?,
            reads_total: counter(
                "os_entropy_device_reads_total",
                "Total device reads that returned data",
            )?,
            zero_reads_total: counter(
                "os_entropy_zero_reads_total",
                "Device reads that returned no bytes after a successful wait",
            )?,
            timeouts_total: counter(
                "os_entropy_wait_timeouts_total",
                "Readiness waits that timed out while the device was starved",
            )?,
            wait_errors_total: counter(
                "os_entropy_wait_errors_total",
                "Readiness waits that failed and were retried",
            )?,
            interrupted_reads_total: counter(
                "os_entropy_interrupted_reads_total",
                "Device reads interrupted by a signal and retried",
            )?,
            bogus_reads_total: counter(
                "os_entropy_bogus_reads_total",
                "Device reads that reported more bytes than requested",
            )?,
            notices_total: counter(
                "os_entropy_starvation_notices_total",
                "Operator notices about entropy starvation",
            )?,
            device_opens_total: counter(
                "os_entropy_device_opens_total",
                "Entropy devices opened",
            )?,
            fatal_errors_total: counter(
                "os_entropy_fatal_errors_total",
                "Gather calls that failed with a fatal device error",
            )?,
            registry,
        })
    }

    /// Updates all metrics from a snapshot of reader statistics.
    ///
    /// Snapshots are cumulative; counters advance by the difference.
    pub fn update(&self, stats: &GatherStats) {
        advance(&self.requests_total, stats.requests);
        advance(&self.bytes_total, stats.bytes);
        advance(&self.reads_total, stats.reads);
        advance(&self.zero_reads_total, stats.zero_reads);
        advance(&self.timeouts_total, stats.timeouts);
        advance(&self.wait_errors_total, stats.wait_errors);
        advance(&self.interrupted_reads_total, stats.interrupted_reads);
        advance(&self.bogus_reads_total, stats.bogus_reads);
        advance(&self.notices_total, stats.notices);
        advance(&self.device_opens_total, stats.device_opens);
        advance(&self.fatal_errors_total, stats.fatal_errors);
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let stats = GatherStats {
            requests: 3,
            bytes: 96,
            reads: 4,
            zero_reads: 2,
            timeouts: 7,
            notices: 1,
            device_opens: 1,
            ..Default::default()
        };
        registry.update(&stats);

        let output = registry.encode().unwrap();
        assert!(output.contains("os_entropy_gather_requests_total 3"));
        assert!(output.contains("os_entropy_gather_bytes_total 96"));
        assert!(output.contains("os_entropy_wait_timeouts_total 7"));
        assert!(output.contains("os_entropy_zero_reads_total 2"));
        assert!(output.contains("os_entropy_starvation_notices_total 1"));
    }

    #[test]
    fn test_counters_never_decrease() {
        let registry = MetricsRegistry::new().unwrap();

        registry.update(&GatherStats {
            bytes: 64,
            ..Default::default()
        });
        registry.update(&GatherStats {
            bytes: 32,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("os_entropy_gather_bytes_total 64"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("os_entropy_device_opens_total"));
        assert!(output.contains("os_entropy_fatal_errors_total"));
        assert!(output.contains("os_entropy_bogus_reads_total"));
    }
}
