//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Main binary for the employee statistic service

use employee_statistic::{
    config::{StatisticConfig, DEFAULT_CONFIG_PATH},
    http::HttpServer,
    init_service, shutdown_service, StatisticError, SERVICE_NAME, SERVICE_VERSION,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", SERVICE_NAME, SERVICE_VERSION);

    // Load configuration
    let config = load_config().await?;
    info!(
        "Configuration loaded: employee service '{}' via {:?} registry",
        config.employee_service, config.registry.backend
    );

    // Initialize service
    let service = Arc::new(init_service(config.clone()).await?);

    // Create HTTP server
    let http_server = HttpServer::new(service.clone());
    let app = http_server.create_router();

    // Start HTTP server
    let addr: std::net::SocketAddr = config.listen_endpoint.parse()?;
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(service.shutdown_token()));

    if let Err(e) = server.await {
        error!("HTTP server error: {}", e);
    }

    shutdown_service(&service).await?;
    Ok(())
}

/// Load configuration from file, then apply environment overrides
async fn load_config() -> Result<StatisticConfig, StatisticError> {
    let config_path =
        std::env::var("STATISTIC_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = match StatisticConfig::from_file(&config_path).await {
        Ok(config) => {
            info!("Loaded configuration from {}", config_path);
            config
        }
        Err(e) => {
            warn!("{}, using defaults", e);
            StatisticConfig::default()
        }
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Graceful shutdown signal handler.
///
/// Cancels `token` as soon as the signal arrives, aborting in-flight
/// upstream fetches.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, shutting down");
        }
        _ = terminate => {
            info!("SIGTERM received, shutting down");
        }
    }

    token.cancel();
}
