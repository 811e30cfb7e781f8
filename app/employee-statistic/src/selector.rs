//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Endpoint selector
//!
//! Resolves a logical service name to one healthy instance and caches the
//! resolution per service for a bounded TTL. A cached entry moves through
//! `Unresolved -> Resolved -> Expired/Failed -> Unresolved`; expiry and
//! [`EndpointSelector::mark_failed`] both force the next `select` back to
//! the registry.
//!
//! Each service has its own slot. Reads of a valid entry only take the
//! slot's cache lock, which is never held across an await. Resolution is
//! serialized by a separate per-slot mutex so that callers arriving during
//! expiry wait for the single in-flight lookup and reuse its result, a
//! failed one included.

use crate::{
    config::SelectionConfig,
    discovery::RegistryClient,
    error::StatisticError,
    types::{ResolvedEndpoint, SelectionPolicy, ServiceInstance},
    StatisticResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Per-service resolution state
#[derive(Default)]
struct ServiceSlot {
    cached: RwLock<Option<ResolvedEndpoint>>,
    resolving: Mutex<()>,
    /// Completed resolution attempts, successful or not
    attempts: AtomicU64,
    /// Error of the latest attempt, cleared by the next success
    last_failure: RwLock<Option<StatisticError>>,
    next_index: AtomicUsize,
}

impl ServiceSlot {
    /// Error of the attempt that completed after `seen`, if it failed
    async fn failure_since(&self, seen: u64) -> Option<StatisticError> {
        if self.attempts.load(Ordering::Acquire) == seen {
            return None;
        }
        self.last_failure.read().await.as_ref().map(replay_failure)
    }

    async fn valid_instance(&self) -> Option<ServiceInstance> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|resolved| resolved.is_valid())
            .map(|resolved| resolved.instance.clone())
    }
}

/// Health-filtered, TTL-cached instance selector
pub struct EndpointSelector {
    registry: Arc<dyn RegistryClient>,
    policy: SelectionPolicy,
    ttl: Duration,
    slots: RwLock<HashMap<String, Arc<ServiceSlot>>>,
    lookups: AtomicU64,
}

impl EndpointSelector {
    /// Create new endpoint selector
    pub fn new(registry: Arc<dyn RegistryClient>, config: &SelectionConfig) -> Self {
        Self {
            registry,
            policy: config.policy,
            ttl: config.ttl,
            slots: RwLock::new(HashMap::new()),
            lookups: AtomicU64::new(0),
        }
    }

    /// Registry the selector resolves against
    pub fn registry(&self) -> &Arc<dyn RegistryClient> {
        &self.registry
    }

    /// Select an instance of `service_name`
    pub async fn select(&self, service_name: &str) -> StatisticResult<ServiceInstance> {
        let slot = self.slot(service_name).await;

        if let Some(instance) = slot.valid_instance().await {
            debug!("Using cached endpoint {}", instance);
            return Ok(instance);
        }

        let seen = slot.attempts.load(Ordering::Acquire);
        let _resolving = slot.resolving.lock().await;

        // Resolved by another caller while we waited
        if let Some(instance) = slot.valid_instance().await {
            debug!("Using endpoint {} resolved by a concurrent caller", instance);
            return Ok(instance);
        }

        // The lookup we waited on failed; share its outcome
        if let Some(err) = slot.failure_since(seen).await {
            debug!("Reusing failed resolution of {}: {}", service_name, err);
            return Err(err);
        }

        let failed = {
            let cached = slot.cached.read().await;
            cached
                .as_ref()
                .filter(|resolved| resolved.failed)
                .map(|resolved| resolved.instance.clone())
        };

        let result = self.resolve(service_name, &slot, failed.as_ref()).await;

        let instance = match result {
            Ok(instance) => {
                *slot.last_failure.write().await = None;
                *slot.cached.write().await =
                    Some(ResolvedEndpoint::new(instance.clone(), self.ttl));
                slot.attempts.fetch_add(1, Ordering::Release);
                instance
            }
            Err(err) => {
                *slot.last_failure.write().await = Some(replay_failure(&err));
                slot.attempts.fetch_add(1, Ordering::Release);
                return Err(err);
            }
        };

        info!("Resolved {} to {}", service_name, instance.base_url());
        Ok(instance)
    }

    /// Invalidate the cached resolution of `service_name`
    pub async fn mark_failed(&self, service_name: &str) {
        let slot = self.slot(service_name).await;
        let mut cached = slot.cached.write().await;
        if let Some(resolved) = cached.as_mut() {
            warn!("Marking endpoint {} as failed", resolved.instance);
            resolved.failed = true;
        }
    }

    /// Invalidate the cached resolution only if it still points at `instance`.
    ///
    /// A concurrent caller may already have replaced the entry with a fresh
    /// resolution, which must survive a late failure report.
    pub async fn mark_instance_failed(&self, service_name: &str, instance: &ServiceInstance) {
        let slot = self.slot(service_name).await;
        let mut cached = slot.cached.write().await;
        match cached.as_mut() {
            Some(resolved) if resolved.instance.same_address(instance) => {
                warn!("Marking endpoint {} as failed", instance);
                resolved.failed = true;
            }
            _ => debug!("Ignoring stale failure report for {}", instance),
        }
    }

    /// Current cached resolution, valid or not
    pub async fn cached_endpoint(&self, service_name: &str) -> Option<ResolvedEndpoint> {
        let slots = self.slots.read().await;
        match slots.get(service_name) {
            Some(slot) => slot.cached.read().await.clone(),
            None => None,
        }
    }

    /// Number of registry lookups performed so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Drop every cached resolution
    pub async fn clear(&self) {
        let mut slots = self.slots.write().await;
        slots.clear();
        debug!("Cleared endpoint cache");
    }

    async fn slot(&self, service_name: &str) -> Arc<ServiceSlot> {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(service_name) {
                return slot.clone();
            }
        }

        let mut slots = self.slots.write().await;
        slots
            .entry(service_name.to_string())
            .or_insert_with(|| Arc::new(ServiceSlot::default()))
            .clone()
    }

    async fn resolve(
        &self,
        service_name: &str,
        slot: &ServiceSlot,
        failed: Option<&ServiceInstance>,
    ) -> StatisticResult<ServiceInstance> {
        debug!(
            "Resolving {} through {} registry",
            service_name,
            self.registry.backend_name()
        );

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let instances = self.registry.lookup(service_name).await?;

        let healthy: Vec<ServiceInstance> = instances
            .into_iter()
            .filter(|instance| instance.healthy)
            .collect();

        if healthy.is_empty() {
            return Err(StatisticError::NoHealthyInstance(service_name.to_string()));
        }

        // Steer away from the instance that just failed when there is a choice
        let candidates = match failed {
            Some(failed) if healthy.len() > 1 => {
                let others: Vec<ServiceInstance> = healthy
                    .iter()
                    .filter(|instance| !instance.same_address(failed))
                    .cloned()
                    .collect();
                if others.is_empty() {
                    healthy
                } else {
                    others
                }
            }
            _ => healthy,
        };

        let index = match self.policy {
            SelectionPolicy::RoundRobin => {
                slot.next_index.fetch_add(1, Ordering::Relaxed) % candidates.len()
            }
            SelectionPolicy::Random => {
                use rand::Rng;
                rand::thread_rng().gen_range(0..candidates.len())
            }
        };

        Ok(candidates[index].clone())
    }
}

/// Copy of a resolution error handed to callers that waited on it
fn replay_failure(err: &StatisticError) -> StatisticError {
    match err {
        StatisticError::NoHealthyInstance(service) => {
            StatisticError::NoHealthyInstance(service.clone())
        }
        StatisticError::RegistryUnavailable(reason) => {
            StatisticError::RegistryUnavailable(reason.clone())
        }
        other => StatisticError::RegistryUnavailable(other.to_string()),
    }
}
