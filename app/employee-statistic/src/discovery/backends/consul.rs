//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Consul registry backend implementation

use super::{normalize_base_url, trait_def::RegistryClient};
use crate::{error::StatisticError, types::ServiceInstance, StatisticResult};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Consul registry backend
pub struct ConsulBackend {
    http_client: HttpClient,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: NodeInfo,
    service: ServiceInfo,
    #[serde(default)]
    checks: Vec<CheckInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeInfo {
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceInfo {
    #[serde(default)]
    address: String,
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CheckInfo {
    status: String,
}

impl ConsulBackend {
    pub fn new(
        endpoints: &[String],
        token: Option<String>,
        timeout: Duration,
    ) -> StatisticResult<Self> {
        let endpoint = endpoints.first().ok_or_else(|| {
            StatisticError::Configuration("No Consul endpoints configured".to_string())
        })?;

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                StatisticError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: normalize_base_url(endpoint)?,
            token,
        })
    }

    /// Make an authenticated request to Consul API
    async fn make_consul_request(&self, path: &str) -> StatisticResult<reqwest::Response> {
        let url = format!("{}/v1{}", self.base_url, path);

        let mut request = self.http_client.get(&url);
        if let Some(ref token) = self.token {
            request = request.header("X-Consul-Token", token);
        }

        request.send().await.map_err(|e| {
            StatisticError::RegistryUnavailable(format!("Consul request failed: {}", e))
        })
    }

    fn to_instance(service_name: &str, entry: HealthEntry) -> ServiceInstance {
        // Consul leaves ServiceAddress empty when the service uses the node address
        let host = if entry.service.address.is_empty() {
            entry.node.address
        } else {
            entry.service.address
        };
        let healthy = entry.checks.iter().all(|c| c.status == "passing");
        ServiceInstance::new(service_name, host, entry.service.port, healthy)
    }
}

#[async_trait]
impl RegistryClient for ConsulBackend {
    async fn lookup(&self, service_name: &str) -> StatisticResult<Vec<ServiceInstance>> {
        debug!("Looking up {} in Consul", service_name);

        let response = self
            .make_consul_request(&format!("/health/service/{}", service_name))
            .await?;

        if !response.status().is_success() {
            warn!("Consul lookup for {} failed: HTTP {}", service_name, response.status());
            return Err(StatisticError::RegistryUnavailable(format!(
                "Consul answered HTTP {}",
                response.status()
            )));
        }

        let entries: Vec<HealthEntry> = response.json().await.map_err(|e| {
            StatisticError::RegistryUnavailable(format!("Failed to parse Consul response: {}", e))
        })?;

        Ok(entries
            .into_iter()
            .map(|entry| Self::to_instance(service_name, entry))
            .collect())
    }

    async fn health_check(&self) -> StatisticResult<bool> {
        let response = self.make_consul_request("/status/leader").await?;
        Ok(response.status().is_success())
    }

    fn backend_name(&self) -> &'static str {
        "consul"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::HeaderMap, routing::get, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    async fn spawn_consul() -> String {
        let app = Router::new()
            .route(
                "/v1/health/service/{name}",
                get(|Path(name): Path<String>, headers: HeaderMap| async move {
                    if name != "employee-service" {
                        return Json(json!([]));
                    }
                    let token_ok = headers
                        .get("X-Consul-Token")
                        .map(|v| v == "secret")
                        .unwrap_or(false);
                    let status = if token_ok { "passing" } else { "critical" };
                    Json(json!([
                        {
                            "Node": {"Address": "10.0.1.1"},
                            "Service": {"Service": "employee-service", "Address": "", "Port": 8080},
                            "Checks": [{"Status": "passing"}, {"Status": status}]
                        },
                        {
                            "Node": {"Address": "10.0.1.2"},
                            "Service": {"Service": "employee-service", "Address": "10.0.2.2", "Port": 8081},
                            "Checks": [{"Status": "critical"}]
                        }
                    ]))
                }),
            )
            .route("/v1/status/leader", get(|| async { Json(Value::from("10.0.1.1:8300")) }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_consul_lookup() {
        let endpoint = spawn_consul().await;
        let backend = ConsulBackend::new(
            &[endpoint],
            Some("secret".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();

        let instances = backend.lookup("employee-service").await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].host, "10.0.1.1");
        assert!(instances[0].healthy);
        assert_eq!(instances[1].host, "10.0.2.2");
        assert_eq!(instances[1].port, 8081);
        assert!(!instances[1].healthy);

        assert!(backend.lookup("payroll").await.unwrap().is_empty());
        assert!(backend.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_consul_without_token_sees_failing_checks() {
        let endpoint = spawn_consul().await;
        let backend = ConsulBackend::new(&[endpoint], None, Duration::from_secs(2)).unwrap();

        let instances = backend.lookup("employee-service").await.unwrap();
        assert!(instances.iter().all(|i| !i.healthy));
    }
}
