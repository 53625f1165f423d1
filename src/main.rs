//! Rollcall: a small HTTP service exposing a users resource.
//!
//! This is the application entry point. It loads configuration, initializes
//! tracing, registers the controllers on a fresh route table and serves it
//! until the process is signalled. Any startup failure is logged and the
//! process exits non-zero.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rollcall::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER};
use rollcall::controllers::register_controllers;
use rollcall::http::start_server;
use rollcall::RouteTable;

/// Rollcall: a small HTTP service exposing a users resource
#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about)]
struct Args {
    /// Path to configuration file (defaults to config/default.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g., "rollcall=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_tracing(filter: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    // Logging format lives in the config file, so it has to be read first.
    // On failure fall back to text logs so the error is still reported.
    let config = match AppConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&log_filter, LogFormat::Text);
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&log_filter, config.logging.format);

    tracing::info!(
        host = %config.http.host,
        port = config.http.port,
        "Loaded configuration"
    );

    let mut routes = RouteTable::new();
    if let Err(e) = register_controllers(&mut routes) {
        tracing::error!(error = %e, "Failed to register routes");
        return ExitCode::FAILURE;
    }

    match start_server(&config.http, routes).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "HTTP server failed");
            ExitCode::FAILURE
        }
    }
}
