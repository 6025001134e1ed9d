//! Route Deprecation Middleware
//!
//! Marks routes of an axum application as deprecated, signals the
//! deprecation to clients and API documentation, and optionally retires
//! routes once their deprecation date has passed.
//!
//! # Features
//!
//! - **Deprecation Headers**: `Deprecation` and `Link` headers on every
//!   response from a deprecated route
//! - **Sunset Enforcement**: `410 Gone` after the deprecation date, globally
//!   or per route
//! - **Access Logging**: warnings for each request to a deprecated route
//! - **Schema Annotation**: OpenAPI `deprecated`, `description` and
//!   `externalDocs` fields set at route registration
//! - **Usage Tracking**: Prometheus metrics for deprecated route usage
//!
//! # Example Configuration
//!
//! ```yaml
//! deprecatedRoutes:
//!   - path: /api/v1/users
//!     deprecationDate: "2025-06-01"
//!     alternate: /api/v2/users
//!     rejectAfterDeprecation: true
//! logDeprecationAccess: true
//! setDeprecatedInSchema: true
//! ```
//!
//! # Example
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use route_deprecation::{DeprecatedRoute, DeprecationConfig, DeprecationPlugin};
//!
//! # fn main() -> Result<(), route_deprecation::ConfigError> {
//! let config = DeprecationConfig::default().with_route(
//!     DeprecatedRoute::new("/api/v1/users")
//!         .with_deprecation_date("2025-06-01")
//!         .with_alternate("/api/v2/users"),
//! );
//! let plugin = DeprecationPlugin::new(config)?;
//!
//! let app: Router = Router::new()
//!     .route("/api/v1/users", get(|| async { "users" }))
//!     .layer(plugin.layer());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod headers;
pub mod layer;
pub mod metrics;
pub mod plugin;
pub mod schema;

pub use config::{DeprecatedRoute, DeprecationConfig, EffectivePolicy, GlobalPolicy};
pub use error::ConfigError;
pub use layer::{DeprecationLayer, DeprecationService};
pub use plugin::{Clock, DeprecationPlugin, FixedClock, Interception, SystemClock};
pub use schema::{RouteDefinition, RouteHook, RouteRegistry, RouteSchema};
