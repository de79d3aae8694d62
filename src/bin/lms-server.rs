// ABOUTME: HTTP server binary for the LMS backend
// ABOUTME: Loads configuration, migrates and seeds the database, then serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LMS Server
//!
//! ```bash
//! DATABASE_URL=sqlite:./data/lms.db HTTP_PORT=8081 lms-server
//! lms-server --port 9000 --database-url sqlite::memory:
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lms_server::config::{DatabaseConfig, ServerConfig};
use lms_server::database::Database;
use lms_server::resources::ServerResources;
use lms_server::{logging, routes};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "lms-server",
    about = "Multi-site LMS HTTP server",
    long_about = "Serves learner, admin and certificate validation endpoints over HTTP"
)]
struct Args {
    /// Port override (otherwise `HTTP_PORT`)
    #[arg(long)]
    port: Option<u16>,

    /// Database URL override (otherwise `DATABASE_URL`)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(url) = args.database_url {
        config.database = DatabaseConfig { url };
    }

    logging::init(&config.logging)?;
    info!(
        port = config.http_port,
        database = %config.database.url,
        primary_site = %config.primary_site,
        "Starting LMS server"
    );

    let database = Database::new(&config.database).await?;
    database.tenants().seed_core_sites().await?;
    database.tenants().resolve(config.primary_site).await?;

    let resources = Arc::new(ServerResources::new(database, &config));
    let router = routes::api_router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("LMS server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
