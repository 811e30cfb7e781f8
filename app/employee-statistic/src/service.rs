//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Statistic service composing selector, fetcher and aggregator

use crate::{
    aggregator,
    config::StatisticConfig,
    discovery::{BackendFactory, RegistryClient},
    fetcher::RemoteFetcher,
    selector::EndpointSelector,
    types::{EmployeeRecord, ResolvedEndpoint, StatisticMetrics},
    StatisticResult,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Employee statistic service
pub struct EmployeeStatisticService {
    /// Service configuration
    config: StatisticConfig,

    /// Registry backend
    registry: Arc<dyn RegistryClient>,

    /// Endpoint selector
    selector: Arc<EndpointSelector>,

    /// Remote fetcher
    fetcher: Arc<RemoteFetcher>,

    /// Cancelled on shutdown; every in-flight fetch listens on a child token
    shutdown: CancellationToken,

    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
}

impl EmployeeStatisticService {
    /// Create a new statistic service with the configured registry backend
    pub fn new(config: StatisticConfig) -> StatisticResult<Self> {
        config.validate()?;
        let registry = BackendFactory::create_backend(&config)?;
        Self::with_registry(config, registry)
    }

    /// Create a new statistic service on top of an existing registry client
    pub fn with_registry(
        config: StatisticConfig,
        registry: Arc<dyn RegistryClient>,
    ) -> StatisticResult<Self> {
        let selector = Arc::new(EndpointSelector::new(registry.clone(), &config.selection));
        let fetcher = Arc::new(RemoteFetcher::new(selector.clone(), &config.fetch)?);

        Ok(Self {
            config,
            registry,
            selector,
            fetcher,
            shutdown: CancellationToken::new(),
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
        })
    }

    /// Service configuration
    pub fn config(&self) -> &StatisticConfig {
        &self.config
    }

    /// Token cancelled when the service shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Average work period of all employees, in days
    pub async fn average_work_period(&self) -> StatisticResult<f64> {
        self.average_work_period_with_cancel(&self.shutdown.child_token())
            .await
    }

    /// Average work period, aborted when `token` is cancelled
    pub async fn average_work_period_with_cancel(
        &self,
        token: &CancellationToken,
    ) -> StatisticResult<f64> {
        let records = self.fetch_employees(token).await?;
        let result = aggregator::average_tenure(&records, aggregator::today());
        if let Ok(avg) = result {
            debug!("Average work period over {} employees: {}", records.len(), avg);
        }
        result
    }

    /// Departments with the largest number of employees
    pub async fn largest_employee_number_departments(&self) -> StatisticResult<Vec<String>> {
        self.largest_employee_number_departments_with_cancel(&self.shutdown.child_token())
            .await
    }

    /// Largest departments, aborted when `token` is cancelled
    pub async fn largest_employee_number_departments_with_cancel(
        &self,
        token: &CancellationToken,
    ) -> StatisticResult<Vec<String>> {
        let records = self.fetch_employees(token).await?;
        Ok(aggregator::departments_with_max_headcount(&records))
    }

    /// Whether the registry backend answers its health check
    pub async fn registry_ready(&self) -> bool {
        match self.registry.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!("Registry health check failed: {}", e);
                false
            }
        }
    }

    /// Cached resolution for `service_name`
    pub async fn cached_endpoint(&self, service_name: &str) -> Option<ResolvedEndpoint> {
        self.selector.cached_endpoint(service_name).await
    }

    /// Snapshot of the service counters
    pub fn metrics(&self) -> StatisticMetrics {
        StatisticMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            fetch_retries: self.fetcher.retry_count(),
            registry_lookups: self.selector.lookup_count(),
        }
    }

    /// Cancel in-flight fetches and drop cached resolutions
    pub async fn shutdown(&self) -> StatisticResult<()> {
        info!("Shutting down statistic service {}", self.config.service_id);
        self.shutdown.cancel();
        self.selector.clear().await;
        Ok(())
    }

    async fn fetch_employees(
        &self,
        token: &CancellationToken,
    ) -> StatisticResult<Vec<EmployeeRecord>> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        match self
            .fetcher
            .fetch_with_cancel(&self.config.employee_service, token)
            .await
        {
            Ok(records) => {
                self.successful_requests.fetch_add(1, Ordering::Relaxed);
                Ok(records)
            }
            Err(e) => {
                warn!(
                    "Fetching employees from {} failed: {}",
                    self.config.employee_service, e
                );
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}
