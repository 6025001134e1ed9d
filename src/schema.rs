//! Route schema annotation for OpenAPI documentation.
//!
//! Route definitions are registered once at startup. Every installed
//! [`RouteHook`] sees each definition before it is stored, which is where
//! deprecated routes get their schema marked.

use crate::config::{DeprecatedRoute, GlobalPolicy};
use crate::headers::alternate_suffix;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// The OpenAPI operation fields of a route's declared schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    /// Any other schema fields (body, querystring, response, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// External documentation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDocumentation {
    /// URL.
    pub url: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A declared route as seen at registration time.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDefinition {
    pub method: Method,
    pub url: String,
    pub schema: Option<RouteSchema>,
}

impl RouteDefinition {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: RouteSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Hook invoked once per route registration.
pub trait RouteHook: Send + Sync {
    fn on_route(&self, route: &mut RouteDefinition);
}

/// Collects route definitions and runs registration hooks over them.
#[derive(Default)]
pub struct RouteRegistry {
    hooks: Vec<Arc<dyn RouteHook>>,
    routes: Vec<RouteDefinition>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a hook. Only routes registered afterwards are passed to it.
    pub fn with_hook(mut self, hook: impl RouteHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Register a route, replacing any earlier definition with the same
    /// method and URL.
    pub fn register(&mut self, mut route: RouteDefinition) -> &RouteDefinition {
        for hook in &self.hooks {
            hook.on_route(&mut route);
        }

        let existing = self
            .routes
            .iter()
            .position(|r| r.method == route.method && r.url == route.url);

        let index = match existing {
            Some(index) => {
                self.routes[index] = route;
                index
            }
            None => {
                self.routes.push(route);
                self.routes.len() - 1
            }
        };
        &self.routes[index]
    }

    pub fn get(&self, method: &Method, url: &str) -> Option<&RouteDefinition> {
        self.routes
            .iter()
            .find(|r| &r.method == method && r.url == url)
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }
}

/// Mark a route's schema as deprecated and describe the deprecation.
pub fn annotate_schema(
    route: &mut RouteDefinition,
    rule: &DeprecatedRoute,
    policy: &GlobalPolicy,
) {
    let mut schema = route.schema.take().unwrap_or_default();
    schema.deprecated = Some(true);

    let mut message = match rule.deprecation_date() {
        Some(raw) => match rule.parsed_deprecation_date() {
            Some(date) => format!(
                "This route will be deprecated on {} and removed in the future.",
                date.format("%Y-%m-%d")
            ),
            None => {
                tracing::warn!(
                    path = %rule.path,
                    deprecation_date = %raw,
                    "Cannot parse deprecation date, using the default deprecation message"
                );
                policy.deprecation_message.clone()
            }
        },
        None => policy.deprecation_message.clone(),
    };

    if let Some(alternate) = rule.alternate() {
        message.push_str(&alternate_suffix(Some(alternate)));
        schema.external_docs = Some(ExternalDocumentation {
            url: alternate.to_string(),
            description: Some("Refer to the alternate route for more details.".to_string()),
        });
    }

    schema.description = Some(match schema.description.take().filter(|d| !d.is_empty()) {
        Some(existing) => format!("{}\n\n{}", message, existing),
        None => message,
    });

    route.schema = Some(schema);
}
