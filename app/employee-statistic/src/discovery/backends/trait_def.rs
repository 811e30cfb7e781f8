//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Registry client trait definition

use crate::{types::ServiceInstance, StatisticResult};
use async_trait::async_trait;

/// Read-only view of a discovery registry.
///
/// Implementations do not cache; resolution policy lives in the selector.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Current instances known for `service_name`.
    ///
    /// An unknown service yields an empty set. Fails with
    /// `RegistryUnavailable` when the backend cannot be reached.
    async fn lookup(&self, service_name: &str) -> StatisticResult<Vec<ServiceInstance>>;

    /// Health check for the backend
    async fn health_check(&self) -> StatisticResult<bool>;

    /// Backend name used in logs
    fn backend_name(&self) -> &'static str;
}
