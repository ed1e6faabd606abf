//! Prometheus counters for interception decisions.

use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Outcome of intercepting one request.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum DecisionLabel {
    Passthrough,
    Mocked,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DecisionLabels {
    pub decision: DecisionLabel,
    pub method: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MockErrorLabels {
    pub reason: String,
}

/// All swagger-faker metrics.
pub struct MetricsRegistry {
    pub registry: Registry,
    pub requests_total: Family<DecisionLabels, Counter>,
    pub mock_errors_total: Family<MockErrorLabels, Counter>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests_total = Family::<DecisionLabels, Counter>::default();
        registry.register(
            "swagger_faker_requests",
            "Requests seen by the interceptor, by decision",
            requests_total.clone(),
        );

        let mock_errors_total = Family::<MockErrorLabels, Counter>::default();
        registry.register(
            "swagger_faker_mock_errors",
            "Mock responses that failed to build",
            mock_errors_total.clone(),
        );

        Self {
            registry,
            requests_total,
            mock_errors_total,
        }
    }

    pub fn record_decision(&self, decision: DecisionLabel, method: &str) {
        self.requests_total
            .get_or_create(&DecisionLabels {
                decision,
                method: method.to_string(),
            })
            .inc();
    }

    pub fn record_mock_error(&self, reason: &str) {
        self.mock_errors_total
            .get_or_create(&MockErrorLabels {
                reason: reason.to_string(),
            })
            .inc();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_are_counted_per_label() {
        let metrics = MetricsRegistry::new();
        metrics.record_decision(DecisionLabel::Mocked, "GET");
        metrics.record_decision(DecisionLabel::Mocked, "GET");
        metrics.record_decision(DecisionLabel::Passthrough, "GET");

        let mocked = metrics
            .requests_total
            .get_or_create(&DecisionLabels {
                decision: DecisionLabel::Mocked,
                method: "GET".to_string(),
            })
            .get();
        assert_eq!(mocked, 2);
    }
}
