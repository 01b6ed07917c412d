//! Prometheus metrics exporter for entropy gathering.
//!
//! This module provides observability into the reader by exposing its
//! cumulative statistics in Prometheus format and a snapshot of its device
//! health. With the `metrics` feature both are served over loopback HTTP,
//! read from the reader at scrape time.
//!
//! # Metrics Exposed
//!
//! - `os_entropy_gather_requests_total` - Successful gather calls
//! - `os_entropy_gather_bytes_total` - Bytes delivered to callers
//! - `os_entropy_device_reads_total` - Device reads that returned data
//! - `os_entropy_zero_reads_total` - Readable devices that returned no bytes
//! - `os_entropy_wait_timeouts_total` - Readiness waits that timed out
//! - `os_entropy_wait_errors_total` - Readiness waits that failed
//! - `os_entropy_interrupted_reads_total` - Reads interrupted by signals
//! - `os_entropy_bogus_reads_total` - Reads that over-reported and were clamped
//! - `os_entropy_starvation_notices_total` - Operator notices emitted
//! - `os_entropy_device_opens_total` - Devices opened
//! - `os_entropy_fatal_errors_total` - Gathers that failed fatally
//!
//! # Example
//!
//! ```no_run
//! use os_entropy::{gather::EntropyReader, metrics::MetricsRegistry};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let reader = EntropyReader::global();
//!
//! let mut key = [0u8; 32];
//! reader.gather(&mut key, 2).expect("entropy device failed");
//!
//! registry.update(&reader.stats());
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
mod health;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry};
pub use health::{DeviceHealth, TierHealth};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
