//! Route Deprecation - CLI Entry Point
//!
//! Validates deprecation configuration and previews how a request URL would
//! be handled.

use anyhow::{Context, Result};
use axum::http::Method;
use clap::Parser;
use route_deprecation::config::parse_deprecation_date;
use route_deprecation::{
    Clock, DeprecationConfig, DeprecationPlugin, FixedClock, RouteDefinition, RouteHook,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "route-deprecation",
    about = "Route deprecation policy tool",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "route-deprecation.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Show how a request to this URL would be handled
    #[arg(long, value_name = "URL")]
    check: Option<String>,

    /// Evaluate --check at this instant instead of now
    #[arg(long, value_name = "DATE", requires = "check")]
    at: Option<String>,

    /// Print metrics after --check
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let default_config = include_str!("../config/default-config.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    let config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        DeprecationConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration");
        DeprecationConfig::default()
    };

    if args.validate {
        config.validate()?;
        println!("Configuration is valid");
        return Ok(());
    }

    let Some(url) = args.check else {
        let policy = config.resolve();
        println!("Deprecated routes: {}", config.deprecated_routes.len());
        println!("  deprecationMessage:     {}", policy.deprecation_message);
        println!("  logDeprecationAccess:   {}", policy.log_deprecation_access);
        println!("  rejectAfterDeprecation: {}", policy.reject_after_deprecation);
        println!("  setDeprecatedInSchema:  {}", policy.set_deprecated_in_schema);
        return Ok(());
    };

    let clock: Arc<dyn Clock> = match &args.at {
        Some(at) => Arc::new(FixedClock(
            parse_deprecation_date(at).with_context(|| format!("invalid --at date: {}", at))?,
        )),
        None => Arc::new(SystemClock),
    };

    let plugin = DeprecationPlugin::with_clock(config, clock)?;
    check(&plugin, &url)?;

    if args.metrics {
        if let Some(metrics) = plugin.metrics() {
            print!("{}", metrics.encode()?);
        }
    }

    Ok(())
}

/// Print the interception decision and schema annotation for a URL.
fn check(plugin: &DeprecationPlugin, url: &str) -> Result<()> {
    match plugin.intercept(url) {
        None => println!("{} is not deprecated", url),
        Some(interception) => {
            match &interception.rejection {
                Some(_) => println!("Status: 410 Gone"),
                None => println!("Status: passed to handler"),
            }
            for (name, value) in interception.headers.iter() {
                println!("{}: {}", name, value);
            }
            if let Some(body) = &interception.rejection {
                println!("{}", serde_json::to_string_pretty(body)?);
            }
        }
    }

    let mut route = RouteDefinition::new(Method::GET, url);
    plugin.on_route(&mut route);
    if let Some(schema) = &route.schema {
        println!("Schema:");
        println!("{}", serde_json::to_string_pretty(schema)?);
    }

    Ok(())
}
