//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Error types for the employee statistic service

use axum::http::StatusCode;
use thiserror::Error;

/// Error type for statistic operations
#[derive(Error, Debug)]
pub enum StatisticError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("No healthy instance for service: {0}")]
    NoHealthyInstance(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Bad upstream response: HTTP {0}")]
    BadResponse(u16),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("No employee records to aggregate")]
    EmptyInput,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatisticError {
    /// Whether the failure is transport-level and worth one retry against
    /// another instance
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StatisticError::Timeout(_) | StatisticError::ConnectionRefused(_)
        )
    }

    /// Get the error type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            StatisticError::Configuration(_) => "Configuration",
            StatisticError::RegistryUnavailable(_) => "RegistryUnavailable",
            StatisticError::NoHealthyInstance(_) => "NoHealthyInstance",
            StatisticError::Timeout(_) => "Timeout",
            StatisticError::ConnectionRefused(_) => "ConnectionRefused",
            StatisticError::BadResponse(_) => "BadResponse",
            StatisticError::Decode(_) => "DecodeError",
            StatisticError::EmptyInput => "EmptyInput",
            StatisticError::Cancelled => "Cancelled",
            StatisticError::Internal(_) => "Internal",
            StatisticError::Other(_) => "Internal",
        }
    }

    /// HTTP status the statistics endpoints answer with for this error.
    ///
    /// Registry-side problems are 503 (upstream cannot be located), anything
    /// that went wrong talking to a located instance is 502.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StatisticError::RegistryUnavailable(_)
            | StatisticError::NoHealthyInstance(_)
            | StatisticError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            StatisticError::Timeout(_)
            | StatisticError::ConnectionRefused(_)
            | StatisticError::BadResponse(_)
            | StatisticError::Decode(_) => StatusCode::BAD_GATEWAY,
            StatisticError::EmptyInput => StatusCode::NO_CONTENT,
            StatisticError::Configuration(_)
            | StatisticError::Internal(_)
            | StatisticError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for StatisticError {
    fn from(err: std::io::Error) -> Self {
        StatisticError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for StatisticError {
    fn from(err: serde_json::Error) -> Self {
        StatisticError::Decode(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for StatisticError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        StatisticError::Timeout(err.to_string())
    }
}

impl From<reqwest::Error> for StatisticError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StatisticError::Timeout(err.to_string())
        } else if err.is_connect() {
            StatisticError::ConnectionRefused(err.to_string())
        } else if err.is_decode() {
            StatisticError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StatisticError::BadResponse(status.as_u16())
        } else {
            StatisticError::ConnectionRefused(err.to_string())
        }
    }
}
