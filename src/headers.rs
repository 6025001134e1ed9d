//! Header and response body generation for deprecated routes.
//!
//! - `Deprecation` header carrying the configured date verbatim, or `true`
//! - `Link` header pointing at the alternate route
//! - `410 Gone` JSON body once a route is past its deprecation date

use crate::config::DeprecatedRoute;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Builder for deprecation-related HTTP headers.
#[derive(Debug, Clone, Default)]
pub struct DeprecationHeaders {
    headers: Vec<(HeaderName, String)>,
}

impl DeprecationHeaders {
    /// Create an empty header builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build headers for a deprecated route.
    pub fn for_route(route: &DeprecatedRoute) -> Self {
        let deprecation = route.deprecation_date().unwrap_or("true");
        let builder =
            Self::new().with_header(HeaderName::from_static("deprecation"), deprecation);

        match route.alternate() {
            Some(alternate) => builder.with_header(
                axum::http::header::LINK,
                format!("<{}>; rel=\"alternate,deprecated\"", alternate),
            ),
            None => builder,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Look up a header value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.headers.iter().map(|(n, v)| (n, v.as_str()))
    }

    /// Write the headers into a response header map.
    ///
    /// Values that are not valid header text are skipped.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    target.insert(name.clone(), v);
                }
                Err(_) => {
                    tracing::warn!(
                        header = %name,
                        value = %value,
                        "Skipping deprecation header with invalid value"
                    );
                }
            }
        }
    }
}

/// Format an instant as ISO 8601 in UTC with millisecond precision.
/// Example: 2021-01-01T00:00:00.000Z
pub fn iso_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the warning logged when a deprecated route is accessed.
///
/// Absent clauses leave their surrounding spaces in place.
pub fn access_log_message(
    url: &str,
    route: &DeprecatedRoute,
    deprecation_date: Option<&DateTime<Utc>>,
) -> String {
    let date_clause = match (route.deprecation_date(), deprecation_date) {
        (Some(_), Some(date)) => format!("Deprecation date: {}.", iso_timestamp(date)),
        (Some(raw), None) => format!("Deprecation date: {}.", raw),
        (None, _) => String::new(),
    };

    let alternate_clause = route
        .alternate()
        .map(|alternate| format!("Consider using alternate route: {}.", alternate))
        .unwrap_or_default();

    format!(
        "Deprecated route accessed: {}. {} {}",
        url, date_clause, alternate_clause
    )
}

/// Body of a `410 Gone` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoneBody {
    pub error: &'static str,
    pub message: String,
}

impl GoneBody {
    pub fn new(deprecation_date: &DateTime<Utc>, alternate: Option<&str>) -> Self {
        Self {
            error: "Gone",
            message: format!(
                "This route has been deprecated as of {} and is no longer available.{}",
                iso_timestamp(deprecation_date),
                alternate_suffix(alternate)
            ),
        }
    }
}

/// The " Please use ... instead." sentence shared by responses and schemas.
pub fn alternate_suffix(alternate: Option<&str>) -> String {
    alternate
        .map(|alternate| format!(" Please use {} instead.", alternate))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midnight() -> DateTime<Utc> {
        "2021-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_deprecation_header_with_date() {
        let route = DeprecatedRoute::new("/test").with_deprecation_date("2025-01-01");
        let headers = DeprecationHeaders::for_route(&route);

        assert_eq!(headers.get("Deprecation"), Some("2025-01-01"));
        assert_eq!(headers.get("Link"), None);
    }

    #[test]
    fn test_deprecation_header_is_verbatim() {
        let route =
            DeprecatedRoute::new("/test").with_deprecation_date("2025-01-01T10:00:00+02:00");
        let headers = DeprecationHeaders::for_route(&route);
        assert_eq!(headers.get("deprecation"), Some("2025-01-01T10:00:00+02:00"));
    }

    #[test]
    fn test_deprecation_header_without_date() {
        let route = DeprecatedRoute::new("/test");
        let headers = DeprecationHeaders::for_route(&route);
        assert_eq!(headers.get("Deprecation"), Some("true"));
    }

    #[test]
    fn test_link_header() {
        let route = DeprecatedRoute::new("/test").with_alternate("/new-route");
        let headers = DeprecationHeaders::for_route(&route);

        assert_eq!(headers.get("Deprecation"), Some("true"));
        assert_eq!(
            headers.get("Link"),
            Some("</new-route>; rel=\"alternate,deprecated\"")
        );
    }

    #[test]
    fn test_apply_skips_invalid_values() {
        let route = DeprecatedRoute::new("/test")
            .with_deprecation_date("2025-01-01\n")
            .with_alternate("/new-route");
        let mut map = HeaderMap::new();
        DeprecationHeaders::for_route(&route).apply(&mut map);

        assert!(map.get("deprecation").is_none());
        assert_eq!(
            map.get("link").unwrap(),
            "</new-route>; rel=\"alternate,deprecated\""
        );
    }

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(iso_timestamp(&midnight()), "2021-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_access_log_message_with_date() {
        let route = DeprecatedRoute::new("/test").with_deprecation_date("2021-01-01");
        let message = access_log_message("/test", &route, Some(&midnight()));
        assert_eq!(
            message,
            "Deprecated route accessed: /test. Deprecation date: 2021-01-01T00:00:00.000Z. "
        );
    }

    #[test]
    fn test_access_log_message_all_clauses() {
        let route = DeprecatedRoute::new("/test")
            .with_deprecation_date("2021-01-01")
            .with_alternate("/new");
        let message = access_log_message("/test", &route, Some(&midnight()));
        assert_eq!(
            message,
            "Deprecated route accessed: /test. Deprecation date: 2021-01-01T00:00:00.000Z. Consider using alternate route: /new."
        );
    }

    #[test]
    fn test_access_log_message_keeps_spacing() {
        let route = DeprecatedRoute::new("/test").with_alternate("/new");
        assert_eq!(
            access_log_message("/test", &route, None),
            "Deprecated route accessed: /test.  Consider using alternate route: /new."
        );

        let bare = DeprecatedRoute::new("/test");
        assert_eq!(
            access_log_message("/test", &bare, None),
            "Deprecated route accessed: /test.  "
        );
    }

    #[test]
    fn test_access_log_message_invalid_date() {
        let route = DeprecatedRoute::new("/test").with_deprecation_date("someday");
        assert_eq!(
            access_log_message("/test", &route, None),
            "Deprecated route accessed: /test. Deprecation date: someday. "
        );
    }

    #[test]
    fn test_gone_body() {
        let body = GoneBody::new(&midnight(), None);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "error": "Gone",
                "message": "This route has been deprecated as of 2021-01-01T00:00:00.000Z and is no longer available."
            })
        );

        let body = GoneBody::new(&midnight(), Some("/v2/test"));
        assert_eq!(
            body.message,
            "This route has been deprecated as of 2021-01-01T00:00:00.000Z and is no longer available. Please use /v2/test instead."
        );
    }
}
