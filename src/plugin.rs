//! Main route deprecation plugin implementation.

use crate::config::{DeprecationConfig, GlobalPolicy};
use crate::error::ConfigError;
use crate::headers::{access_log_message, DeprecationHeaders, GoneBody};
use crate::layer::DeprecationLayer;
use crate::metrics::DeprecationMetrics;
use crate::schema::{annotate_schema, RouteDefinition, RouteHook};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source of the current time, used to decide whether a route is past its
/// deprecation date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Route Deprecation Plugin
///
/// Holds the deprecated route table and the resolved global policy. The
/// request interceptor ([`DeprecationPlugin::layer`]) and the schema
/// annotator ([`RouteHook`]) both read from the same immutable state, so
/// cloning the plugin is cheap and needs no locking.
#[derive(Clone)]
pub struct DeprecationPlugin {
    state: Arc<PluginState>,
}

struct PluginState {
    config: DeprecationConfig,
    policy: GlobalPolicy,
    metrics: Option<DeprecationMetrics>,
    clock: Arc<dyn Clock>,
}

/// Outcome of intercepting a request to a deprecated route.
#[derive(Debug, Clone)]
pub struct Interception {
    /// Headers to add to the response, whether served or rejected
    pub headers: DeprecationHeaders,
    /// Set when the request must be answered with 410 Gone
    pub rejection: Option<GoneBody>,
}

impl Interception {
    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

impl DeprecationPlugin {
    /// Create a new plugin using the system clock.
    pub fn new(config: DeprecationConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new plugin reading the current time from `clock`.
    pub fn with_clock(
        config: DeprecationConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let metrics = if config.metrics.enabled {
            Some(DeprecationMetrics::new(&config.metrics.prefix)?)
        } else {
            None
        };

        if let Some(metrics) = &metrics {
            let now = clock.now();
            for route in &config.deprecated_routes {
                if let Some(date) = route.parsed_deprecation_date() {
                    metrics.set_days_until_deprecation(&route.path, (date - now).num_days());
                }
            }
        }

        let policy = config.resolve();

        info!(
            routes = config.deprecated_routes.len(),
            reject_after_deprecation = policy.reject_after_deprecation,
            set_deprecated_in_schema = policy.set_deprecated_in_schema,
            "Route deprecation plugin initialized"
        );

        Ok(Self {
            state: Arc::new(PluginState {
                config,
                policy,
                metrics,
                clock,
            }),
        })
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::new(DeprecationConfig::from_yaml(yaml)?)
    }

    pub fn config(&self) -> &DeprecationConfig {
        &self.state.config
    }

    /// The global policy with defaults applied.
    pub fn policy(&self) -> &GlobalPolicy {
        &self.state.policy
    }

    /// Get the metrics collector, if metrics are enabled.
    pub fn metrics(&self) -> Option<&DeprecationMetrics> {
        self.state.metrics.as_ref()
    }

    /// Tower layer running [`DeprecationPlugin::intercept`] before every request.
    pub fn layer(&self) -> DeprecationLayer {
        DeprecationLayer::new(self.clone())
    }

    /// Process a request URL and determine the deprecation response.
    ///
    /// Returns `None` when the URL is not a deprecated route.
    pub fn intercept(&self, url: &str) -> Option<Interception> {
        let route = self.state.config.find_route(url)?;
        let policy = self.state.policy.effective_for(route);
        let deprecation_date = route.parsed_deprecation_date();

        debug!(
            path = %url,
            reject_after_deprecation = policy.reject_after_deprecation,
            "Request matches deprecated route"
        );

        if policy.log_deprecation_access {
            warn!(
                path = %url,
                "{}",
                access_log_message(url, route, deprecation_date.as_ref())
            );
        }

        let headers = DeprecationHeaders::for_route(route);

        let rejection = if policy.reject_after_deprecation {
            let now = self.state.clock.now();
            deprecation_date
                .filter(|date| now > *date)
                .map(|date| GoneBody::new(&date, route.alternate()))
        } else {
            None
        };

        if let Some(metrics) = &self.state.metrics {
            if rejection.is_some() {
                metrics.record_rejected(&route.path);
            } else {
                metrics.record_served(&route.path);
            }
        }

        Some(Interception { headers, rejection })
    }
}

impl RouteHook for DeprecationPlugin {
    fn on_route(&self, route: &mut RouteDefinition) {
        if !self.state.policy.set_deprecated_in_schema {
            return;
        }

        let Some(rule) = self.state.config.find_route(&route.url) else {
            return;
        };

        annotate_schema(route, rule, &self.state.policy);

        debug!(method = %route.method, path = %route.url, "Marked route schema as deprecated");

        if let Some(metrics) = &self.state.metrics {
            metrics.record_annotation(&rule.path);
        }
    }
}
