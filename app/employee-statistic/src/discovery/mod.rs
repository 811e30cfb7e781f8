//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Service discovery for locating the employee service

pub mod backends;

pub use backends::{
    BackendFactory, ConsulBackend, EurekaBackend, RegistryClient, StaticBackend,
};
