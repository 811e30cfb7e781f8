//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! HTTP server for the employee statistic service

use crate::{error::StatisticError, service::EmployeeStatisticService, types::generate_request_id};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, Request, Response, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router as AxumRouter,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

/// HTTP server for the statistic service
#[derive(Clone)]
pub struct HttpServer {
    service: Arc<EmployeeStatisticService>,
}

impl HttpServer {
    /// Create new HTTP server
    pub fn new(service: Arc<EmployeeStatisticService>) -> Self {
        Self { service }
    }

    /// Create router with all endpoints
    pub fn create_router(&self) -> AxumRouter {
        let app = AxumRouter::new()
            // Statistic endpoints
            .route(
                "/company-employees-statistic/average-work-period",
                get(Self::average_work_period),
            )
            .route(
                "/company-employees-statistic/largest-employee-number-department",
                get(Self::largest_employee_number_department),
            )
            // Health and monitoring endpoints
            .route("/health", get(Self::health_check))
            .route("/health/live", get(Self::health_live))
            .route("/health/ready", get(Self::health_ready))
            .route("/metrics", get(Self::metrics))
            .route("/selector/endpoints/{service}", get(Self::cached_endpoint))
            .with_state(Arc::new(self.clone()));

        app.layer(middleware::from_fn_with_state(
            Arc::new(self.clone()),
            Self::logging_middleware,
        ))
    }

    /// Average work period in the company, in days
    async fn average_work_period(State(server): State<Arc<Self>>) -> Response<Body> {
        let token = server.service.shutdown_token().child_token();
        match server.service.average_work_period_with_cancel(&token).await {
            Ok(avg) => (StatusCode::OK, Json(avg)).into_response(),
            Err(e) => Self::error_response(e),
        }
    }

    /// Departments with the largest number of employees
    async fn largest_employee_number_department(
        State(server): State<Arc<Self>>,
    ) -> Response<Body> {
        let token = server.service.shutdown_token().child_token();
        match server
            .service
            .largest_employee_number_departments_with_cancel(&token)
            .await
        {
            Ok(departments) => (StatusCode::OK, Json(departments)).into_response(),
            Err(e) => Self::error_response(e),
        }
    }

    /// Health check endpoint
    async fn health_check(State(server): State<Arc<Self>>) -> impl IntoResponse {
        let response = json!({
            "status": "healthy",
            "service_id": server.service.config().service_id,
            "version": crate::SERVICE_VERSION,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (StatusCode::OK, Json(response))
    }

    /// Liveness probe endpoint
    async fn health_live(State(_server): State<Arc<Self>>) -> impl IntoResponse {
        let response = json!({
            "status": "alive",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (StatusCode::OK, Json(response))
    }

    /// Readiness probe endpoint
    async fn health_ready(State(server): State<Arc<Self>>) -> impl IntoResponse {
        let is_ready = server.service.registry_ready().await;
        let status_code = if is_ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        let response = json!({
            "status": if is_ready { "ready" } else { "not_ready" },
            "registry": server.service.config().registry.backend,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status_code, Json(response))
    }

    /// Metrics endpoint (JSON format)
    async fn metrics(State(server): State<Arc<Self>>) -> impl IntoResponse {
        let response = json!({
            "metrics": server.service.metrics(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (StatusCode::OK, Json(response))
    }

    /// Cached resolution of a service
    async fn cached_endpoint(
        State(server): State<Arc<Self>>,
        Path(service_name): Path<String>,
    ) -> impl IntoResponse {
        let endpoint = server
            .service
            .cached_endpoint(&service_name)
            .await
            .map(|resolved| {
                json!({
                    "instance": resolved.instance,
                    "url": resolved.instance.base_url(),
                    "age_ms": resolved.age().as_millis() as u64,
                    "ttl_ms": resolved.ttl.as_millis() as u64,
                    "valid": resolved.is_valid(),
                })
            });

        let response = json!({
            "service": service_name,
            "endpoint": endpoint,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (StatusCode::OK, Json(response))
    }

    /// Map a pipeline error to a response carrying only the error kind
    fn error_response(err: StatisticError) -> Response<Body> {
        let status = err.status_code();
        if status == StatusCode::NO_CONTENT {
            debug!("No employee data to aggregate");
            return status.into_response();
        }

        error!("Statistic request failed: {}", err);
        let response = json!({
            "error": err.error_type(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (status, Json(response)).into_response()
    }

    /// Logging middleware
    async fn logging_middleware(
        State(_server): State<Arc<Self>>,
        request: Request<Body>,
        next: middleware::Next,
    ) -> Response<Body> {
        let start = std::time::Instant::now();
        let method = request.method().clone();
        let uri = request.uri().clone();
        let request_id = generate_request_id();

        let mut response = next.run(request).await;

        let latency = start.elapsed();
        info!(
            "{} {} {} {}ms request_id={}",
            method,
            uri,
            response.status(),
            latency.as_millis(),
            request_id
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("X-Request-Id", value);
        }

        response
    }
}
