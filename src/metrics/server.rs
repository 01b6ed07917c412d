//! Loopback HTTP exporter for a running reader.
//!
//! Statistics are read from the reader when a scrape arrives, so the
//! gather path never touches the exporter.

use super::{DeviceHealth, MetricsError, MetricsRegistry};
use crate::gather::EntropyReader;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Errors that can occur while serving metrics.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Exporter settings. The exporter only ever binds the loopback interface.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Binds `127.0.0.1:port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], port).into(),
        }
    }
}

/// What the handlers see: the reader being observed and the counters
/// mirroring it.
pub struct MetricsState {
    reader: &'static EntropyReader,
    registry: MetricsRegistry,
}

impl MetricsState {
    /// Observes `reader` through `registry`.
    pub fn new(reader: &'static EntropyReader, registry: MetricsRegistry) -> Self {
        Self { reader, registry }
    }

    /// Brings the counters up to the reader's current totals and encodes them.
    pub fn scrape(&self) -> Result<String, MetricsError> {
        self.registry.update(&self.reader.stats());
        self.registry.encode()
    }

    /// Returns the reader's device health.
    pub fn health(&self) -> DeviceHealth {
        DeviceHealth::of(self.reader)
    }
}

/// Serves `/metrics` and `/health` for one reader.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<MetricsState>,
}

impl MetricsServer {
    /// Creates an exporter for `state`.
    pub fn new(config: MetricsServerConfig, state: MetricsState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Binds and serves until the runtime shuts down.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics server listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    match state.scrape() {
        Ok(output) => (StatusCode::OK, [("content-type", PROMETHEUS_TEXT)], output),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", TEXT_PLAIN)],
                format!("failed to encode metrics: {}", e),
            )
        }
    }
}

/// 200 while every gather has succeeded, 503 once one failed fatally.
async fn health_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    let health = state.health();
    let status = if health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, [("content-type", TEXT_PLAIN)], health.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceTier;

    fn global_state() -> MetricsState {
        MetricsState::new(EntropyReader::global(), MetricsRegistry::new().unwrap())
    }

    fn counter_value(output: &str, name: &str) -> u64 {
        output
            .lines()
            .find_map(|line| line.strip_prefix(name)?.trim().parse().ok())
            .unwrap()
    }

    #[test]
    fn test_config_is_loopback() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9090);
        assert!(config.bind_addr.ip().is_loopback());
        assert!(MetricsServerConfig::with_port(9464).bind_addr.ip().is_loopback());
    }

    #[test]
    fn test_scrape_reads_reader_totals() {
        let state = global_state();
        let before = counter_value(&state.scrape().unwrap(), "os_entropy_gather_bytes_total");

        EntropyReader::global().gather(&mut [0u8; 24], 0).unwrap();

        let after = counter_value(&state.scrape().unwrap(), "os_entropy_gather_bytes_total");
        assert!(after >= before + 24);
    }

    #[tokio::test]
    async fn test_health_reports_open_fast_tier() {
        EntropyReader::global().gather(&mut [0u8; 8], 0).unwrap();
        let state = Arc::new(global_state());

        let health = state.health();
        let fast = health
            .tiers
            .iter()
            .find(|t| t.tier == DeviceTier::Fast)
            .unwrap();
        assert!(fast.open);

        let response = health_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
