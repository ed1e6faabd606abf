//! Structured logging: JSON lines by default, pretty output for local runs.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry();

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_filter(filter),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_line_number(true).with_filter(filter))
            .try_init(),
    };

    installed.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Values of the `event` field carried by every log line.
pub mod events {
    pub const STARTUP: &str = "startup";
    pub const LISTENING: &str = "listening";
    /// The API document was parsed and registered with the generator.
    pub const DOCUMENT_LOADED: &str = "document_loaded";
    /// A request was either passed through or answered with a mock.
    pub const REQUEST_INTERCEPTED: &str = "request_intercepted";
    /// A numeric override header did not parse and was read as zero.
    pub const OVERRIDE_COERCED: &str = "override_coerced";
    /// Building a mock response failed.
    pub const MOCK_ERROR: &str = "mock_error";
}

#[macro_export]
macro_rules! log_startup {
    ($($field:tt)*) => { tracing::info!(event = $crate::logging::events::STARTUP, $($field)*) };
}

#[macro_export]
macro_rules! log_listening {
    ($($field:tt)*) => { tracing::info!(event = $crate::logging::events::LISTENING, $($field)*) };
}

#[macro_export]
macro_rules! log_document_loaded {
    ($($field:tt)*) => {
        tracing::info!(event = $crate::logging::events::DOCUMENT_LOADED, $($field)*)
    };
}

/// Debug level: one line per request.
#[macro_export]
macro_rules! log_request_intercepted {
    ($($field:tt)*) => {
        tracing::debug!(event = $crate::logging::events::REQUEST_INTERCEPTED, $($field)*)
    };
}

#[macro_export]
macro_rules! log_override_coerced {
    ($($field:tt)*) => {
        tracing::warn!(event = $crate::logging::events::OVERRIDE_COERCED, $($field)*)
    };
}

#[macro_export]
macro_rules! log_mock_error {
    ($($field:tt)*) => { tracing::error!(event = $crate::logging::events::MOCK_ERROR, $($field)*) };
}
