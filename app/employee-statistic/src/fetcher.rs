//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Remote fetcher for the employee collection

use crate::{
    config::FetchConfig,
    error::StatisticError,
    selector::EndpointSelector,
    types::{EmployeeRecord, ServiceInstance},
    StatisticResult,
};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Fetches employee records from a selector-resolved instance
pub struct RemoteFetcher {
    selector: Arc<EndpointSelector>,
    http_client: Client,
    base_path: String,
    retry_enabled: bool,
    retries: AtomicU64,
}

impl RemoteFetcher {
    /// Create new remote fetcher
    pub fn new(selector: Arc<EndpointSelector>, config: &FetchConfig) -> StatisticResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                StatisticError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            selector,
            http_client,
            base_path: config.base_path.trim_end_matches('/').to_string(),
            retry_enabled: config.retry_enabled,
            retries: AtomicU64::new(0),
        })
    }

    /// Selector used to resolve instances
    pub fn selector(&self) -> &Arc<EndpointSelector> {
        &self.selector
    }

    /// Number of retries issued so far
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// URL of the employee collection on `instance`
    pub fn employees_url(&self, instance: &ServiceInstance) -> String {
        format!("{}{}/all", instance.base_url(), self.base_path)
    }

    /// Fetch all employees of `service_name`.
    ///
    /// Transport failures (timeout, refused connection) invalidate the
    /// resolution and are retried once against a freshly selected instance.
    /// Non-2xx answers and undecodable bodies are not retried.
    pub async fn fetch(&self, service_name: &str) -> StatisticResult<Vec<EmployeeRecord>> {
        let instance = self.selector.select(service_name).await?;

        let error = match self.fetch_from(&instance).await {
            Ok(records) => return Ok(records),
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e),
        };

        self.selector
            .mark_instance_failed(service_name, &instance)
            .await;

        if !self.retry_enabled {
            return Err(error);
        }

        warn!("Fetch from {} failed ({}), retrying once", instance, error);
        self.retries.fetch_add(1, Ordering::Relaxed);

        let retry_instance = self.selector.select(service_name).await?;
        let result = self.fetch_from(&retry_instance).await;

        if let Err(ref e) = result {
            error!("Retry against {} failed: {}", retry_instance, e);
            if e.is_retryable() {
                self.selector
                    .mark_instance_failed(service_name, &retry_instance)
                    .await;
            }
        }

        result
    }

    /// Like [`RemoteFetcher::fetch`], aborting the in-flight call when
    /// `token` is cancelled
    pub async fn fetch_with_cancel(
        &self,
        service_name: &str,
        token: &CancellationToken,
    ) -> StatisticResult<Vec<EmployeeRecord>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Fetch of {} cancelled", service_name);
                Err(StatisticError::Cancelled)
            }
            result = self.fetch(service_name) => result,
        }
    }

    /// Single GET against one instance, no retry
    pub async fn fetch_from(
        &self,
        instance: &ServiceInstance,
    ) -> StatisticResult<Vec<EmployeeRecord>> {
        let url = self.employees_url(instance);
        debug!("Fetching employees from {}", url);

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Employee service at {} answered HTTP {}", instance, status);
            return Err(StatisticError::BadResponse(status.as_u16()));
        }

        let body = response.bytes().await?;
        let records: Vec<EmployeeRecord> = serde_json::from_slice(&body)?;

        debug!("Fetched {} employees from {}", records.len(), instance);
        Ok(records)
    }
}
