//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Registry backends

pub mod consul;
pub mod eureka;
pub mod factory;
pub mod static_backend;
pub mod trait_def;

pub use consul::ConsulBackend;
pub use eureka::EurekaBackend;
pub use factory::BackendFactory;
pub use static_backend::StaticBackend;
pub use trait_def::RegistryClient;

use crate::{error::StatisticError, StatisticResult};

/// Normalize a registry endpoint into a base URL without trailing slash
pub(crate) fn normalize_base_url(endpoint: &str) -> StatisticResult<String> {
    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let url = url::Url::parse(&with_scheme).map_err(|e| {
        StatisticError::Configuration(format!("Invalid registry endpoint {}: {}", endpoint, e))
    })?;

    Ok(url.as_str().trim_end_matches('/').to_string())
}
