//! Metrics for tracking deprecated route usage.
//!
//! Provides Prometheus metrics for monitoring access to deprecated routes.

use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};

/// Metrics collector for deprecated route usage.
#[derive(Clone)]
pub struct DeprecationMetrics {
    /// Registry for all metrics
    registry: Registry,

    /// Counter for requests to deprecated routes, by outcome
    pub requests_total: IntCounterVec,

    /// Counter for route schemas annotated as deprecated
    pub schema_annotations_total: IntCounterVec,

    /// Gauge for days until each route's deprecation date
    pub days_until_deprecation: IntGaugeVec,
}

impl DeprecationMetrics {
    /// Create a new metrics collector with the given prefix.
    pub fn new(prefix: &str) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                format!("{}_requests_total", prefix),
                "Total number of requests to deprecated routes",
            ),
            &["path", "outcome"],
        )?;

        let schema_annotations_total = IntCounterVec::new(
            Opts::new(
                format!("{}_schema_annotations_total", prefix),
                "Total number of route schemas annotated as deprecated",
            ),
            &["path"],
        )?;

        let days_until_deprecation = IntGaugeVec::new(
            Opts::new(
                format!("{}_days_until_deprecation", prefix),
                "Days until the route's deprecation date (negative if past)",
            ),
            &["path"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(schema_annotations_total.clone()))?;
        registry.register(Box::new(days_until_deprecation.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            schema_annotations_total,
            days_until_deprecation,
        })
    }

    /// Record a request that was passed on to the handler.
    pub fn record_served(&self, path: &str) {
        self.requests_total.with_label_values(&[path, "served"]).inc();
    }

    /// Record a request answered with 410 Gone.
    pub fn record_rejected(&self, path: &str) {
        self.requests_total.with_label_values(&[path, "rejected"]).inc();
    }

    /// Record a schema annotation.
    pub fn record_annotation(&self, path: &str) {
        self.schema_annotations_total.with_label_values(&[path]).inc();
    }

    /// Update the days until deprecation gauge.
    pub fn set_days_until_deprecation(&self, path: &str, days: i64) {
        self.days_until_deprecation.with_label_values(&[path]).set(days);
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
