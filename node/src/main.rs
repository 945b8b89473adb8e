// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Gyro Registry Node
//!
//! Entry point for the `gyro-node` binary. Parses CLI arguments,
//! initializes logging and metrics, constructs the registry, and serves
//! the HTTP API plus a Prometheus metrics endpoint.
//!
//! The binary supports two subcommands:
//!
//! - `run`     — start the registry node
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::signal;

use gyro_registry::{Address, Registry, RegistryConfig};

use cli::{Commands, GyroNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = GyroNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the registry node: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "gyro_node=info,gyro_registry=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    // --- Owner identity ---
    let owner = match &args.owner {
        Some(hex) => hex
            .parse::<Address>()
            .with_context(|| format!("invalid owner address: {}", hex))?,
        None => {
            let generated = Address::random();
            tracing::warn!(owner = %generated, "no owner configured, generated a random one");
            generated
        }
    };

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        %owner,
        "starting gyro-node"
    );

    // --- Registry ---
    let registry = Arc::new(RwLock::new(Registry::new(owner, RegistryConfig::default())));

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: chrono::Utc::now(),
        registry,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("registry API listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("gyro-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("gyro-node {}", env!("CARGO_PKG_VERSION"));
    println!(
        "collection {} ({})",
        gyro_registry::config::COLLECTION_NAME,
        gyro_registry::config::COLLECTION_SYMBOL,
    );
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
