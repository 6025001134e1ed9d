//! Configuration for the route deprecation middleware.
//!
//! Defines deprecated routes, process-wide defaults, and the resolution of
//! per-route overrides against those defaults.

use crate::error::ConfigError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Message used for routes without a deprecation date.
pub const DEFAULT_DEPRECATION_MESSAGE: &str =
    "This route is deprecated and may be removed in the future.";

/// Main configuration for the route deprecation middleware.
///
/// Every field is optional; [`DeprecationConfig::resolve`] fills in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeprecationConfig {
    /// Deprecated routes, looked up in order (first match wins)
    #[serde(default)]
    pub deprecated_routes: Vec<DeprecatedRoute>,

    /// Message used in the schema when a route has no deprecation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,

    /// Whether to log access to deprecated routes (default: true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_deprecation_access: Option<bool>,

    /// Whether to answer 410 Gone once a route's date has passed (default: false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_after_deprecation: Option<bool>,

    /// Whether to annotate route schemas as deprecated (default: true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_deprecated_in_schema: Option<bool>,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DeprecationConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validate the configuration.
    ///
    /// Empty paths are rejected. Unparseable dates and duplicate paths are
    /// only reported, since the middleware tolerates both at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (index, route) in self.deprecated_routes.iter().enumerate() {
            if route.path.is_empty() {
                return Err(ConfigError::InvalidRoute {
                    index,
                    reason: "path cannot be empty".to_string(),
                });
            }

            if !seen.insert(route.path.as_str()) {
                tracing::warn!(
                    path = %route.path,
                    "Duplicate deprecated route, only the first entry is used"
                );
            }

            if let Some(raw) = route.deprecation_date() {
                if parse_deprecation_date(raw).is_none() {
                    tracing::warn!(
                        path = %route.path,
                        deprecation_date = %raw,
                        "Deprecation date cannot be parsed, route will never be rejected"
                    );
                }
            }
        }
        Ok(())
    }

    /// Merge the optional settings with their defaults.
    pub fn resolve(&self) -> GlobalPolicy {
        GlobalPolicy {
            deprecation_message: self
                .deprecation_message
                .clone()
                .unwrap_or_else(|| DEFAULT_DEPRECATION_MESSAGE.to_string()),
            log_deprecation_access: self.log_deprecation_access.unwrap_or(true),
            reject_after_deprecation: self.reject_after_deprecation.unwrap_or(false),
            set_deprecated_in_schema: self.set_deprecated_in_schema.unwrap_or(true),
        }
    }

    /// Find the deprecated route registered for an exact path.
    pub fn find_route(&self, path: &str) -> Option<&DeprecatedRoute> {
        self.deprecated_routes.iter().find(|r| r.path == path)
    }

    /// Add a deprecated route.
    pub fn with_route(mut self, route: DeprecatedRoute) -> Self {
        self.deprecated_routes.push(route);
        self
    }

    /// Set the default deprecation message.
    pub fn with_deprecation_message(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = Some(message.into());
        self
    }

    /// Set the default access logging behavior.
    pub fn with_log_deprecation_access(mut self, enabled: bool) -> Self {
        self.log_deprecation_access = Some(enabled);
        self
    }

    /// Set the default rejection behavior.
    pub fn with_reject_after_deprecation(mut self, enabled: bool) -> Self {
        self.reject_after_deprecation = Some(enabled);
        self
    }

    /// Enable or disable schema annotation.
    pub fn with_set_deprecated_in_schema(mut self, enabled: bool) -> Self {
        self.set_deprecated_in_schema = Some(enabled);
        self
    }
}

/// A single deprecated route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeprecatedRoute {
    /// Exact route path (no pattern matching)
    pub path: String,

    /// Date the route is deprecated as of, emitted verbatim in the
    /// `Deprecation` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_date: Option<String>,

    /// Replacement route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<String>,

    /// Overrides the global rejection setting for this route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_after_deprecation: Option<bool>,

    /// Overrides the global logging setting for this route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_deprecation_access: Option<bool>,
}

impl DeprecatedRoute {
    /// Create a route deprecated indefinitely.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deprecation_date: None,
            alternate: None,
            reject_after_deprecation: None,
            log_deprecation_access: None,
        }
    }

    pub fn with_deprecation_date(mut self, date: impl Into<String>) -> Self {
        self.deprecation_date = Some(date.into());
        self
    }

    pub fn with_alternate(mut self, alternate: impl Into<String>) -> Self {
        self.alternate = Some(alternate.into());
        self
    }

    pub fn with_reject_after_deprecation(mut self, enabled: bool) -> Self {
        self.reject_after_deprecation = Some(enabled);
        self
    }

    pub fn with_log_deprecation_access(mut self, enabled: bool) -> Self {
        self.log_deprecation_access = Some(enabled);
        self
    }

    /// The configured date string, if any. Empty strings count as unset.
    pub fn deprecation_date(&self) -> Option<&str> {
        self.deprecation_date.as_deref().filter(|d| !d.is_empty())
    }

    /// The replacement route, if any. Empty strings count as unset.
    pub fn alternate(&self) -> Option<&str> {
        self.alternate.as_deref().filter(|a| !a.is_empty())
    }

    /// The deprecation date as an instant, if set and parseable.
    pub fn parsed_deprecation_date(&self) -> Option<DateTime<Utc>> {
        self.deprecation_date().and_then(parse_deprecation_date)
    }

    /// Check whether the route's deprecation date lies strictly before `now`.
    pub fn is_past_deprecation(&self, now: DateTime<Utc>) -> bool {
        self.parsed_deprecation_date()
            .map(|date| now > date)
            .unwrap_or(false)
    }
}

/// Process-wide settings with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalPolicy {
    pub deprecation_message: String,
    pub log_deprecation_access: bool,
    pub reject_after_deprecation: bool,
    pub set_deprecated_in_schema: bool,
}

impl Default for GlobalPolicy {
    fn default() -> Self {
        DeprecationConfig::default().resolve()
    }
}

impl GlobalPolicy {
    /// Resolve the behavior for one route: route values win when present.
    pub fn effective_for(&self, route: &DeprecatedRoute) -> EffectivePolicy {
        EffectivePolicy {
            log_deprecation_access: route
                .log_deprecation_access
                .unwrap_or(self.log_deprecation_access),
            reject_after_deprecation: route
                .reject_after_deprecation
                .unwrap_or(self.reject_after_deprecation),
        }
    }
}

/// Behavior for a single route after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePolicy {
    pub log_deprecation_access: bool,
    pub reject_after_deprecation: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether to record Prometheus metrics
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prefix for metric names
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: default_metrics_prefix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_metrics_prefix() -> String {
    "route_deprecation".to_string()
}

/// Parse a configured deprecation date.
///
/// Accepts RFC 3339 and the shorter ISO 8601 forms (minutes without
/// seconds, offsets without a colon), naive date-times and dates read as
/// UTC, `YYYY-MM` as the first of the month, `YYYY` as January 1, and
/// RFC 2822 / HTTP-date.
pub fn parse_deprecation_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    if let Some(date) = parse_calendar_date(s) {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    None
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    match s.split('-').collect::<Vec<_>>().as_slice() {
        [year, month, day] if year.len() == 4 && month.len() == 2 && day.len() == 2 => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
        }
        [year, month] if year.len() == 4 && month.len() == 2 => {
            if !all_digits(*year) || !all_digits(*month) {
                return None;
            }
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        [year] if year.len() == 4 && all_digits(*year) => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, 1, 1)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_config() {
        let yaml = r#"
deprecatedRoutes:
  - path: /api/v1/users
    deprecationDate: "2025-06-01"
    alternate: /api/v2/users
    rejectAfterDeprecation: true
  - path: /legacy
    logDeprecationAccess: false
deprecationMessage: "Going away soon."
rejectAfterDeprecation: false
"#;
        let config = DeprecationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.deprecated_routes.len(), 2);
        assert_eq!(config.deprecated_routes[0].path, "/api/v1/users");
        assert_eq!(
            config.deprecated_routes[0].deprecation_date(),
            Some("2025-06-01")
        );
        assert_eq!(config.deprecated_routes[0].alternate(), Some("/api/v2/users"));
        assert_eq!(config.deprecated_routes[1].log_deprecation_access, Some(false));
        assert_eq!(config.deprecation_message.as_deref(), Some("Going away soon."));
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
deprecatedRoutes:
  - path: /test
    sunset: "2025-01-01"
"#;
        assert!(DeprecationConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let policy = DeprecationConfig::default().resolve();
        assert_eq!(policy.deprecation_message, DEFAULT_DEPRECATION_MESSAGE);
        assert!(policy.log_deprecation_access);
        assert!(!policy.reject_after_deprecation);
        assert!(policy.set_deprecated_in_schema);
    }

    #[test]
    fn test_resolve_overrides_defaults() {
        let policy = DeprecationConfig::default()
            .with_deprecation_message("Bye.")
            .with_log_deprecation_access(false)
            .with_reject_after_deprecation(true)
            .with_set_deprecated_in_schema(false)
            .resolve();

        assert_eq!(policy.deprecation_message, "Bye.");
        assert!(!policy.log_deprecation_access);
        assert!(policy.reject_after_deprecation);
        assert!(!policy.set_deprecated_in_schema);
    }

    #[test]
    fn test_route_override_beats_global() {
        let policy = DeprecationConfig::default()
            .with_reject_after_deprecation(true)
            .with_log_deprecation_access(false)
            .resolve();

        let inherit = DeprecatedRoute::new("/a");
        let effective = policy.effective_for(&inherit);
        assert!(effective.reject_after_deprecation);
        assert!(!effective.log_deprecation_access);

        let overridden = DeprecatedRoute::new("/b")
            .with_reject_after_deprecation(false)
            .with_log_deprecation_access(true);
        let effective = policy.effective_for(&overridden);
        assert!(!effective.reject_after_deprecation);
        assert!(effective.log_deprecation_access);
    }

    #[test]
    fn test_find_route_exact_and_first_wins() {
        let config = DeprecationConfig::default()
            .with_route(DeprecatedRoute::new("/test").with_alternate("/first"))
            .with_route(DeprecatedRoute::new("/test").with_alternate("/second"));

        assert_eq!(config.find_route("/test").unwrap().alternate(), Some("/first"));
        assert!(config.find_route("/test/").is_none());
        assert!(config.find_route("/tes").is_none());
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let route = DeprecatedRoute::new("/test")
            .with_deprecation_date("")
            .with_alternate("");
        assert_eq!(route.deprecation_date(), None);
        assert_eq!(route.alternate(), None);
    }

    #[test]
    fn test_parse_deprecation_date_forms() {
        let midnight: DateTime<Utc> = "2021-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(parse_deprecation_date("2021-01-01"), Some(midnight));
        assert_eq!(parse_deprecation_date("2021-01-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_deprecation_date("2021-01-01T00:00:00.000"), Some(midnight));
        assert_eq!(
            parse_deprecation_date("2021-01-01T02:00:00+02:00"),
            Some(midnight)
        );
        assert_eq!(
            parse_deprecation_date("Fri, 01 Jan 2021 00:00:00 GMT"),
            Some(midnight)
        );
        assert_eq!(parse_deprecation_date("2021-01-01T00:00Z"), Some(midnight));
        assert_eq!(parse_deprecation_date("2021-01-01T02:00+02:00"), Some(midnight));
        assert_eq!(parse_deprecation_date("2021-01-01T00:00"), Some(midnight));
        assert_eq!(
            parse_deprecation_date("2021-01-01T00:00:00.000+0000"),
            Some(midnight)
        );
        assert_eq!(parse_deprecation_date("2021-01"), Some(midnight));
        assert_eq!(parse_deprecation_date("2021"), Some(midnight));
        assert_eq!(parse_deprecation_date("2021-1"), None);
        assert_eq!(parse_deprecation_date("20210101"), None);
        assert_eq!(parse_deprecation_date("not a date"), None);
        assert_eq!(parse_deprecation_date("2021-13-45"), None);
    }

    #[test]
    fn test_past_deprecation_is_strict() {
        let route = DeprecatedRoute::new("/test").with_deprecation_date("2021-01-01");
        let boundary: DateTime<Utc> = "2021-01-01T00:00:00Z".parse().unwrap();

        assert!(!route.is_past_deprecation(boundary));
        assert!(route.is_past_deprecation(boundary + chrono::Duration::milliseconds(1)));
        assert!(!route.is_past_deprecation(boundary - chrono::Duration::days(1)));

        let invalid = DeprecatedRoute::new("/test").with_deprecation_date("soon");
        assert!(!invalid.is_past_deprecation(Utc::now()));
    }

    #[test]
    fn test_validate() {
        let config = DeprecationConfig::default()
            .with_route(DeprecatedRoute::new("/ok").with_deprecation_date("whenever"))
            .with_route(DeprecatedRoute::new("/ok"));
        assert!(config.validate().is_ok());

        let config = DeprecationConfig::default().with_route(DeprecatedRoute::new(""));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRoute { index: 0, .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deprecation.yaml");
        std::fs::write(&path, "deprecatedRoutes:\n  - path: /test\n").unwrap();

        let config = DeprecationConfig::from_file(&path).unwrap();
        assert_eq!(config.deprecated_routes.len(), 1);

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            DeprecationConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
