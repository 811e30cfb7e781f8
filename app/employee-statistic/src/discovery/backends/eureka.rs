//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Eureka registry backend implementation
//!
//! Talks to the Eureka REST API (`GET /eureka/apps/{APP}`) in its JSON
//! representation. Eureka upper-cases application names, so lookups do too.

use super::{normalize_base_url, trait_def::RegistryClient};
use crate::{error::StatisticError, types::ServiceInstance, StatisticResult};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Eureka registry backend
pub struct EurekaBackend {
    http_client: HttpClient,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationEnvelope {
    application: Application,
}

#[derive(Debug, Deserialize)]
struct Application {
    #[serde(default)]
    instance: Vec<InstanceInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceInfo {
    host_name: String,
    #[serde(default)]
    ip_addr: Option<String>,
    port: PortInfo,
    status: String,
}

#[derive(Debug, Deserialize)]
struct PortInfo {
    #[serde(rename = "$")]
    port: u16,
}

impl EurekaBackend {
    pub fn new(endpoints: &[String], timeout: Duration) -> StatisticResult<Self> {
        let endpoint = endpoints.first().ok_or_else(|| {
            StatisticError::Configuration("No Eureka endpoints configured".to_string())
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
        })
    }

    /// Eureka serves its API under `/eureka`; accept endpoints with or without it
    fn apps_url(&self, suffix: &str) -> String {
        if self.base_url.ends_with("/eureka") {
            format!("{}/apps{}", self.base_url, suffix)
        } else {
            format!("{}/eureka/apps{}", self.base_url, suffix)
        }
    }

    fn to_instance(service_name: &str, info: InstanceInfo) -> ServiceInstance {
        let host = if info.host_name.is_empty() {
            info.ip_addr.unwrap_or_default()
        } else {
            info.host_name
        };
        let healthy = info.status.eq_ignore_ascii_case("UP");
        ServiceInstance::new(service_name, host, info.port.port, healthy)
    }
}

#[async_trait]
impl RegistryClient for EurekaBackend {
    async fn lookup(&self, service_name: &str) -> StatisticResult<Vec<ServiceInstance>> {
        let url = self.apps_url(&format!("/{}", service_name.to_uppercase()));
        debug!("Looking up {} in Eureka: {}", service_name, url);

        let response = self
            .http_client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                StatisticError::RegistryUnavailable(format!("Eureka request failed: {}", e))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Eureka does not know application {}", service_name);
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            warn!("Eureka lookup for {} failed: HTTP {}", service_name, response.status());
            return Err(StatisticError::RegistryUnavailable(format!(
                "Eureka answered HTTP {}",
                response.status()
            )));
        }

        let envelope: ApplicationEnvelope = response.json().await.map_err(|e| {
            StatisticError::RegistryUnavailable(format!("Failed to parse Eureka response: {}", e))
        })?;

        let instances = envelope
            .application
            .instance
            .into_iter()
            .map(|info| Self::to_instance(service_name, info))
            .collect::<Vec<_>>();

        debug!("Eureka returned {} instances for {}", instances.len(), service_name);
        Ok(instances)
    }

    async fn health_check(&self) -> StatisticResult<bool> {
        let response = self
            .http_client
            .get(self.apps_url(""))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                StatisticError::RegistryUnavailable(format!("Eureka request failed: {}", e))
            })?;

        Ok(response.status().is_success())
    }

    fn backend_name(&self) -> &'static str {
        "eureka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode as AxumStatus, routing::get, Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn spawn_eureka() -> String {
        let app = Router::new().route(
            "/eureka/apps/{app}",
            get(|Path(app): Path<String>| async move {
                if app != "EMPLOYEE-SERVICE" {
                    return Err(AxumStatus::NOT_FOUND);
                }
                Ok(Json(json!({
                    "application": {
                        "name": "EMPLOYEE-SERVICE",
                        "instance": [
                            {
                                "hostName": "10.0.0.1",
                                "ipAddr": "10.0.0.1",
                                "status": "UP",
                                "port": {"$": 8080, "@enabled": "true"}
                            },
                            {
                                "hostName": "10.0.0.2",
                                "ipAddr": "10.0.0.2",
                                "status": "DOWN",
                                "port": {"$": 8081, "@enabled": "true"}
                            }
                        ]
                    }
                })))
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_eureka_lookup() {
        let endpoint = spawn_eureka().await;
        let backend = EurekaBackend::new(&[endpoint], Duration::from_secs(2)).unwrap();

        let instances = backend.lookup("employee-service").await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].host, "10.0.0.1");
        assert_eq!(instances[0].port, 8080);
        assert!(instances[0].healthy);
        assert!(!instances[1].healthy);
        assert_eq!(instances[1].service_name, "employee-service");
    }

    #[tokio::test]
    async fn test_eureka_unknown_application() {
        let endpoint = spawn_eureka().await;
        let backend = EurekaBackend::new(&[endpoint], Duration::from_secs(2)).unwrap();

        let instances = backend.lookup("payroll-service").await.unwrap();
        assert!(instances.is_empty());
    }

    #[tokio::test]
    async fn test_eureka_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend =
            EurekaBackend::new(&[format!("http://{}", addr)], Duration::from_secs(2)).unwrap();
        let result = backend.lookup("employee-service").await;
        assert!(matches!(result, Err(StatisticError::RegistryUnavailable(_))));
    }

    #[test]
    fn test_apps_url_with_eureka_suffix() {
        let backend = EurekaBackend::new(
            &["http://localhost:8761/eureka/".to_string()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            backend.apps_url("/EMPLOYEE-SERVICE"),
            "http://localhost:8761/eureka/apps/EMPLOYEE-SERVICE"
        );
    }

    #[test]
    fn test_missing_endpoint() {
        let result = EurekaBackend::new(&[], Duration::from_secs(1));
        assert!(matches!(result, Err(StatisticError::Configuration(_))));
    }
}
