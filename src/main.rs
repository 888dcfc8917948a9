//! body2header CLI entry point.
//!
//! Runs the extraction middleware in front of a single upstream.

use anyhow::{Context, Result};
use axum::Router;
use body2header::proxy::{forward, Upstream};
use body2header::{ExtractConfig, ExtractionEngine};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "body2header")]
#[command(
    author,
    version,
    about = "Copies JSON request body values into request headers"
)]
struct Args {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "BODY2HEADER_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Upstream base URL requests are forwarded to (e.g. "http://127.0.0.1:9000")
    #[arg(long, env = "BODY2HEADER_UPSTREAM")]
    upstream: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Validate configuration and exit.
    #[arg(long)]
    validate: bool,
}

fn print_example_config() {
    let example = r#"# body2header configuration example
version: "1"
name: "body2header"

# simple: nested paths, every mapping applies
# gated:  top-level keys, optional URL regex per mapping
mode: simple

settings:
  # Maximum body size to buffer (bytes)
  max_body_size: 10485760  # 10MB

mappings:
  - path: "user.id"
    header: "X-User-Id"
  - path: "items[0].sku"
    header: "X-First-Sku"

# Gated mode example:
#
# mode: gated
# mappings:
#   - match: "^/api/orders"
#     property: "tenant"
#     header: "X-Tenant"
#   - property: "region"
#     header: "X-Region"
"#;
    println!("{}", example);
}

fn load_config(path: &Path) -> Result<ExtractConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };

    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    if args.example_config {
        print_example_config();
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ExtractConfig::default(),
    };

    let engine = ExtractionEngine::new(config).context("Invalid mapping configuration")?;

    if args.validate {
        info!(rules = engine.rules().len(), "Configuration is valid");
        return Ok(());
    }

    let upstream = args
        .upstream
        .as_deref()
        .context("--upstream (or BODY2HEADER_UPSTREAM) is required to serve traffic")?;
    let upstream = Upstream::new(upstream)?;

    info!(
        config = ?args.config,
        listen = %args.listen,
        upstream = %upstream.base(),
        mode = engine.mode().as_str(),
        "Starting body2header"
    );

    let app = Arc::new(engine)
        .wrap(
            Router::new()
                .fallback(forward)
                .with_state(Arc::new(upstream)),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;

    info!("body2header ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
