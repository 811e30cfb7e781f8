//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Registry backend factory implementation

use super::consul::ConsulBackend;
use super::eureka::EurekaBackend;
use super::static_backend::StaticBackend;
use super::trait_def::RegistryClient;
use crate::{
    config::{RegistryBackend, StatisticConfig},
    StatisticResult,
};
use std::sync::Arc;
use tracing::info;

/// Factory for creating registry backends
pub struct BackendFactory;

impl BackendFactory {
    pub fn create_backend(config: &StatisticConfig) -> StatisticResult<Arc<dyn RegistryClient>> {
        let registry = &config.registry;
        let backend: Arc<dyn RegistryClient> = match registry.backend {
            RegistryBackend::Eureka => {
                Arc::new(EurekaBackend::new(&registry.endpoints, registry.timeout)?)
            }
            RegistryBackend::Consul => Arc::new(ConsulBackend::new(
                &registry.endpoints,
                registry.token.clone(),
                registry.timeout,
            )?),
            RegistryBackend::Static => Arc::new(StaticBackend::from_config(
                &config.employee_service,
                &registry.static_instances,
            )),
        };

        info!("Created {} registry backend", backend.backend_name());
        Ok(backend)
    }
}
