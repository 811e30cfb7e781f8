//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Test doubles shared by the unit tests

use crate::{
    discovery::RegistryClient, error::StatisticError, types::EmployeeRecord,
    types::ServiceInstance, StatisticResult,
};
use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Json, Router};
use chrono::NaiveDate;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;

/// In-memory registry counting its lookups
pub struct MockRegistry {
    instances: Mutex<Vec<ServiceInstance>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
    delay: Option<Duration>,
}

impl MockRegistry {
    pub fn new(instances: Vec<ServiceInstance>) -> Self {
        Self {
            instances: Mutex::new(instances),
            calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_instances(&self, instances: Vec<ServiceInstance>) {
        *self.instances.lock().unwrap() = instances;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn lookup_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    async fn lookup(&self, _service_name: &str) -> StatisticResult<Vec<ServiceInstance>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StatisticError::RegistryUnavailable("mock registry down".to_string()));
        }
        Ok(self.instances.lock().unwrap().clone())
    }

    async fn health_check(&self) -> StatisticResult<bool> {
        Ok(!self.unavailable.load(Ordering::SeqCst))
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn record(id: i64, department: &str, hired: NaiveDate, left: Option<NaiveDate>) -> EmployeeRecord {
    EmployeeRecord {
        id: id.into(),
        department: department.to_string(),
        hire_date: hired,
        termination_date: left,
    }
}

/// Three former employees (10, 20 and 15 days), two of them in `X`
pub fn sample_records() -> Vec<EmployeeRecord> {
    vec![
        record(1, "X", date(2024, 1, 1), Some(date(2024, 1, 11))),
        record(2, "Y", date(2024, 1, 1), Some(date(2024, 1, 21))),
        record(3, "X", date(2024, 2, 1), Some(date(2024, 2, 16))),
    ]
}

pub fn instance_at(addr: SocketAddr) -> ServiceInstance {
    ServiceInstance::new("employee-service", addr.ip().to_string(), addr.port(), true)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Employee service answering `/company-employees/all` with `records`
pub async fn spawn_employee_service(records: Vec<EmployeeRecord>) -> SocketAddr {
    let app = Router::new().route(
        "/company-employees/all",
        get(move || {
            let records = records.clone();
            async move { Json(records) }
        }),
    );
    serve(app).await
}

/// Employee service that stalls before answering
pub async fn spawn_slow_service(delay: Duration) -> SocketAddr {
    let app = Router::new().route(
        "/company-employees/all",
        get(move || async move {
            tokio::time::sleep(delay).await;
            Json(Vec::<EmployeeRecord>::new())
        }),
    );
    serve(app).await
}

/// Employee service answering with a fixed status
pub async fn spawn_status_service(status: StatusCode) -> SocketAddr {
    let app = Router::new().route("/company-employees/all", get(move || async move { status }));
    serve(app).await
}

/// Employee service answering 200 with a body that is not an employee array
pub async fn spawn_garbage_service() -> SocketAddr {
    let app = Router::new().route(
        "/company-employees/all",
        get(|| async { Json(serde_json::json!({"employees": "none"})) }),
    );
    serve(app).await
}

/// An address nothing listens on
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
