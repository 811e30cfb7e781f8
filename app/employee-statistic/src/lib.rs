//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Employee statistics over a discovery-resolved employee service
//!
//! This crate resolves the employee service through a service registry,
//! fetches its employee collection over HTTP and exposes aggregate
//! statistics (average work period, largest departments) on its own
//! HTTP surface.

pub mod aggregator;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod selector;
pub mod service;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::StatisticConfig;
pub use error::StatisticError;
pub use service::EmployeeStatisticService;
pub use types::*;

/// Result type for statistic operations
pub type StatisticResult<T> = Result<T, StatisticError>;

/// Service version information
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name
pub const SERVICE_NAME: &str = "employee-statistic";

/// Default listen endpoint
pub const DEFAULT_LISTEN_ENDPOINT: &str = "0.0.0.0:8083";

/// Default logical name of the employee service
pub const DEFAULT_EMPLOYEE_SERVICE: &str = "employee-service";

/// Initialize the statistic service
pub async fn init_service(config: StatisticConfig) -> StatisticResult<EmployeeStatisticService> {
    tracing::info!("Initializing {} v{}", SERVICE_NAME, SERVICE_VERSION);

    let service = EmployeeStatisticService::new(config)?;
    tracing::info!(
        "Statistic service initialization completed (registry: {:?})",
        service.config().registry.backend
    );

    Ok(service)
}

/// Shutdown the statistic service
pub async fn shutdown_service(service: &EmployeeStatisticService) -> StatisticResult<()> {
    tracing::info!("Shutting down {}", SERVICE_NAME);

    service.shutdown().await?;
    tracing::info!("Statistic service shutdown completed");

    Ok(())
}
