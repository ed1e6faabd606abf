//! Logging and metrics for swagger-faker.
//!
//! - Structured logging through `tracing-subscriber` (JSON or pretty), with a
//!   fixed set of `event` names and `log_*!` helper macros.
//! - A Prometheus registry counting interception decisions and mock failures.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod prometheus;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::events;
pub use metrics::{DecisionLabel, MetricsRegistry};
pub use prometheus::PROMETHEUS_CONTENT_TYPE;

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Telemetry handle: owns the metrics registry once logging is installed.
pub struct Telemetry {
    config: TelemetryConfig,
    metrics: Arc<MetricsRegistry>,
}

impl Telemetry {
    /// Install the global log subscriber and create the metrics registry.
    pub fn init(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        logging::init_logging(&config)?;
        Ok(Self::init_without_logging(config))
    }

    /// Create the metrics registry only, for hosts (and tests) that install
    /// their own subscriber.
    pub fn init_without_logging(config: TelemetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn render_prometheus(&self) -> String {
        prometheus::render_metrics(&self.metrics)
    }
}
