//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Static registry backend implementation

use super::trait_def::RegistryClient;
use crate::{config::StaticInstanceConfig, types::ServiceInstance, StatisticResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

/// Static registry backend
pub struct StaticBackend {
    services: HashMap<String, Vec<ServiceInstance>>,
}

impl StaticBackend {
    pub fn new(services: HashMap<String, Vec<ServiceInstance>>) -> Self {
        Self { services }
    }

    pub fn from_config(service_name: &str, instances: &[StaticInstanceConfig]) -> Self {
        let instances = instances
            .iter()
            .map(|i| ServiceInstance::new(service_name, i.host.clone(), i.port, i.healthy))
            .collect::<Vec<_>>();

        info!(
            "Initializing static registry backend with {} instances of {}",
            instances.len(),
            service_name
        );

        let mut services = HashMap::new();
        services.insert(service_name.to_string(), instances);
        Self { services }
    }
}

#[async_trait]
impl RegistryClient for StaticBackend {
    async fn lookup(&self, service_name: &str) -> StatisticResult<Vec<ServiceInstance>> {
        let instances = self.services.get(service_name).cloned().unwrap_or_default();
        debug!(
            "Returning {} static instances for {}",
            instances.len(),
            service_name
        );
        Ok(instances)
    }

    async fn health_check(&self) -> StatisticResult<bool> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}
