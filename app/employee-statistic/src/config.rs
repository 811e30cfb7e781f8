//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Configuration for the employee statistic service

use crate::{error::StatisticError, types::SelectionPolicy, StatisticResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/statistic.toml";

/// Configuration for the statistic service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticConfig {
    /// Service instance identifier
    pub service_id: String,

    /// Listen address for the inbound HTTP surface
    pub listen_endpoint: String,

    /// Logical name of the employee service in the registry
    pub employee_service: String,

    /// Registry settings
    pub registry: RegistryConfig,

    /// Endpoint selection settings
    pub selection: SelectionConfig,

    /// Upstream fetch settings
    pub fetch: FetchConfig,
}

impl Default for StatisticConfig {
    fn default() -> Self {
        Self {
            service_id: uuid::Uuid::new_v4().to_string(),
            listen_endpoint: crate::DEFAULT_LISTEN_ENDPOINT.to_string(),
            employee_service: crate::DEFAULT_EMPLOYEE_SERVICE.to_string(),
            registry: RegistryConfig::default(),
            selection: SelectionConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

/// Registry backend types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RegistryBackend {
    Eureka,
    Consul,
    Static,
}

impl std::str::FromStr for RegistryBackend {
    type Err = StatisticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eureka" => Ok(RegistryBackend::Eureka),
            "consul" => Ok(RegistryBackend::Consul),
            "static" => Ok(RegistryBackend::Static),
            other => Err(StatisticError::Configuration(format!(
                "Unknown registry backend: {}",
                other
            ))),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry backend
    pub backend: RegistryBackend,

    /// Registry endpoints, first one is used
    pub endpoints: Vec<String>,

    /// Timeout of a single registry call
    pub timeout: Duration,

    /// ACL token sent to Consul
    #[serde(default)]
    pub token: Option<String>,

    /// Instances served by the static backend
    #[serde(default)]
    pub static_instances: Vec<StaticInstanceConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::Eureka,
            endpoints: vec!["http://localhost:8761".to_string()],
            timeout: Duration::from_secs(5),
            token: None,
            static_instances: Vec::new(),
        }
    }
}

/// Statically configured instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticInstanceConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_healthy")]
    pub healthy: bool,
}

fn default_healthy() -> bool {
    true
}

/// Endpoint selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Policy used to pick among healthy instances
    pub policy: SelectionPolicy,

    /// How long a resolution is cached
    pub ttl: Duration,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::RoundRobin,
            ttl: Duration::from_secs(30),
        }
    }
}

/// Upstream fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Path prefix of the employee collection on the employee service
    pub base_path: String,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Whole-request timeout
    pub request_timeout: Duration,

    /// Retry once against a re-resolved instance on transport failures
    pub retry_enabled: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_path: "/company-employees".to_string(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            retry_enabled: true,
        }
    }
}

impl StatisticConfig {
    /// Load configuration from a TOML file
    pub async fn from_file(path: impl AsRef<Path>) -> StatisticResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            StatisticError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            StatisticError::Configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Apply overrides from environment-style variables
    pub fn apply_overrides<F>(&mut self, var: F) -> StatisticResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(service_id) = var("STATISTIC_SERVICE_ID") {
            self.service_id = service_id;
        }
        if let Some(endpoint) = var("STATISTIC_ENDPOINT") {
            self.listen_endpoint = endpoint;
        }
        if let Some(name) = var("EMPLOYEE_SERVICE_NAME") {
            self.employee_service = name;
        }
        if let Some(backend) = var("REGISTRY_BACKEND") {
            self.registry.backend = backend.parse()?;
        }
        if let Some(endpoints) = var("REGISTRY_ENDPOINTS") {
            self.registry.endpoints = endpoints
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(token) = var("REGISTRY_TOKEN") {
            self.registry.token = Some(token);
        }
        if let Some(ttl) = var("SELECTOR_TTL_SECS") {
            let secs: u64 = ttl.parse().map_err(|_| {
                StatisticError::Configuration(format!("Invalid SELECTOR_TTL_SECS: {}", ttl))
            })?;
            self.selection.ttl = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> StatisticResult<()> {
        if self.listen_endpoint.parse::<SocketAddr>().is_err() {
            return Err(StatisticError::Configuration(format!(
                "Invalid listen endpoint: {}",
                self.listen_endpoint
            )));
        }
        if self.employee_service.trim().is_empty() {
            return Err(StatisticError::Configuration(
                "Employee service name must not be empty".to_string(),
            ));
        }
        if self.selection.ttl.is_zero() {
            return Err(StatisticError::Configuration(
                "Selector TTL must be greater than zero".to_string(),
            ));
        }
        if self.fetch.connect_timeout.is_zero() || self.fetch.request_timeout.is_zero() {
            return Err(StatisticError::Configuration(
                "Fetch timeouts must be greater than zero".to_string(),
            ));
        }
        match self.registry.backend {
            RegistryBackend::Static if self.registry.static_instances.is_empty() => {
                Err(StatisticError::Configuration(
                    "Static registry backend requires at least one instance".to_string(),
                ))
            }
            RegistryBackend::Eureka | RegistryBackend::Consul
                if self.registry.endpoints.is_empty() =>
            {
                Err(StatisticError::Configuration(
                    "Registry backend requires at least one endpoint".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}
