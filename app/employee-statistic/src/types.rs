//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Types for the employee statistic service

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// One network-addressable replica of a service, as reported by the registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    /// Logical service name
    pub service_name: String,

    /// Host name or IP address
    pub host: String,

    /// Port
    pub port: u16,

    /// Health state reported by the registry
    pub healthy: bool,
}

impl ServiceInstance {
    /// Create a new service instance
    pub fn new(service_name: impl Into<String>, host: impl Into<String>, port: u16, healthy: bool) -> Self {
        Self {
            service_name: service_name.into(),
            host: host.into(),
            port,
            healthy,
        }
    }

    /// Two snapshots refer to the same replica when host and port match
    pub fn same_address(&self, other: &ServiceInstance) -> bool {
        self.host == other.host && self.port == other.port
    }

    /// Base URL of the instance, without trailing slash
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.service_name, self.host, self.port)
    }
}

/// A cached selector resolution
#[derive(Debug, Clone)]
pub struct ResolvedEndpoint {
    /// Selected instance
    pub instance: ServiceInstance,

    /// When the resolution happened
    pub resolved_at: Instant,

    /// How long the resolution stays valid
    pub ttl: Duration,

    /// Set when a fetch against the instance failed at the transport level
    pub failed: bool,
}

impl ResolvedEndpoint {
    pub fn new(instance: ServiceInstance, ttl: Duration) -> Self {
        Self {
            instance,
            resolved_at: Instant::now(),
            ttl,
            failed: false,
        }
    }

    /// Expired once `now > resolved_at + ttl`; a TTL past the clock's
    /// range never expires
    pub fn is_expired(&self) -> bool {
        self.resolved_at
            .checked_add(self.ttl)
            .map_or(false, |deadline| Instant::now() > deadline)
    }

    /// Usable when neither expired nor marked failed
    pub fn is_valid(&self) -> bool {
        !self.failed && !self.is_expired()
    }

    /// Age of the resolution
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.resolved_at)
    }
}

/// Employee record as served by the employee service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    /// Opaque identifier, numeric or string depending on the employee service
    pub id: serde_json::Value,

    pub department: String,

    pub hire_date: NaiveDate,

    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
}

impl EmployeeRecord {
    /// Days between hire and termination, or hire and `today` for current staff
    pub fn tenure_days(&self, today: NaiveDate) -> i64 {
        let end = self.termination_date.unwrap_or(today);
        (end - self.hire_date).num_days()
    }
}

/// Selection policy over the healthy instances of a service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionPolicy {
    RoundRobin,
    Random,
}

/// Counters exposed on the metrics endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticMetrics {
    /// Total statistic requests
    pub total_requests: u64,

    /// Requests answered with a statistic
    pub successful_requests: u64,

    /// Requests that failed upstream
    pub failed_requests: u64,

    /// Retries issued against a re-resolved instance
    pub fetch_retries: u64,

    /// Registry lookups performed by the selector
    pub registry_lookups: u64,
}

/// Utility functions
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_record_decodes_camel_case() {
        let json = r#"[
            {"id": 1, "department": "X", "hireDate": "2020-01-01", "terminationDate": "2020-01-11"},
            {"id": 2, "department": "Y", "hireDate": "2021-06-01", "terminationDate": null},
            {"id": 3, "department": "Y", "hireDate": "2022-03-15"}
        ]"#;

        let records: Vec<EmployeeRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].termination_date, NaiveDate::from_ymd_opt(2020, 1, 11));
        assert!(records[1].termination_date.is_none());
        assert!(records[2].termination_date.is_none());
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn test_employee_record_accepts_string_ids() {
        let json = r#"[
            {"id": "e-17", "department": "X", "hireDate": "2020-01-01"},
            {"id": "3f2b8c1e-9a4d-4b7e-8f1a-2c6d5e4f3a2b", "department": "Y", "hireDate": "2021-06-01"}
        ]"#;

        let records: Vec<EmployeeRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].id, "e-17");
        assert_eq!(records[1].department, "Y");
    }

    #[test]
    fn test_tenure_days() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let terminated = EmployeeRecord {
            id: 1.into(),
            department: "X".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            termination_date: NaiveDate::from_ymd_opt(2024, 1, 11),
        };
        let current = EmployeeRecord {
            termination_date: None,
            ..terminated.clone()
        };

        assert_eq!(terminated.tenure_days(today), 10);
        assert_eq!(current.tenure_days(today), 30);
    }

    #[test]
    fn test_instance_address() {
        let a = ServiceInstance::new("employee-service", "10.0.0.1", 8080, true);
        let b = ServiceInstance::new("employee-service", "10.0.0.1", 8080, false);
        assert!(a.same_address(&b));
        assert_eq!(a.base_url(), "http://10.0.0.1:8080");
        assert_eq!(a.to_string(), "employee-service@10.0.0.1:8080");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_endpoint_expiry() {
        let instance = ServiceInstance::new("employee-service", "localhost", 8080, true);
        let mut resolved = ResolvedEndpoint::new(instance, Duration::from_secs(30));
        assert!(resolved.is_valid());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!resolved.is_expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(resolved.is_expired());

        resolved.resolved_at = Instant::now();
        resolved.failed = true;
        assert!(!resolved.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_never_expires() {
        let instance = ServiceInstance::new("employee-service", "localhost", 8080, true);
        let resolved = ResolvedEndpoint::new(instance, Duration::from_secs(u64::MAX));

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!resolved.is_expired());
        assert!(resolved.is_valid());
    }
}
