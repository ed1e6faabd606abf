//! Prometheus text exposition.

use crate::MetricsRegistry;
use prometheus_client::encoding::text::encode;

/// Content-Type header value for Prometheus text format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn render_metrics(registry: &MetricsRegistry) -> String {
    let mut buffer = String::new();
    // Writing into a String cannot fail.
    let _ = encode(&mut buffer, &registry.registry);
    buffer
}
