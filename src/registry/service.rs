//! Service registry: write path, snapshot reads and breaker flag effects.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures_util::future::join_all;

use crate::config::RegistryConfig;
use crate::observability::metrics;
use crate::registry::categories::CategoryTable;
use crate::registry::flags::{FlagSnapshot, FlagStatus, ServiceFlag};
use crate::registry::names;
use crate::registry::store::FlagStore;
use crate::registry::RegistryError;
use crate::resilience::{BoxError, FailureCategory, FlagEffects};

/// Feature flags for the known services, persisted in a [`FlagStore`].
///
/// The store is the source of truth; the registry keeps the last values it
/// read or wrote for diagnostics and change detection.
pub struct ServiceRegistry {
    store: Arc<dyn FlagStore>,
    services: Vec<String>,
    categories: CategoryTable,
    cache: ArcSwap<HashMap<String, FlagStatus>>,
}

impl ServiceRegistry {
    pub fn new(store: Arc<dyn FlagStore>, services: Vec<String>, categories: CategoryTable) -> Self {
        Self {
            store,
            services,
            categories,
            cache: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn from_config(store: Arc<dyn FlagStore>, config: &RegistryConfig) -> Self {
        Self::new(store, config.services.clone(), CategoryTable::from_config(&config.categories))
    }

    /// Known service names, in configuration order.
    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Set the status of a known flag.
    ///
    /// Unknown names fail with [`RegistryError::FlagNotFound`] and touch
    /// nothing, as does a known name with no document in the store.
    pub async fn set_flag(&self, name: &str, status: FlagStatus) -> Result<ServiceFlag, RegistryError> {
        let Some(canonical) = names::resolve(&self.services, name) else {
            tracing::error!(service = %name, "Failed to update service: unknown name");
            return Err(RegistryError::FlagNotFound(name.to_string()));
        };

        let Some(updated) = self.store.write(canonical, status).await? else {
            tracing::error!(service = %canonical, "Failed to update service: no flag document");
            return Err(RegistryError::FlagNotFound(canonical.to_string()));
        };

        tracing::info!(service = %canonical, status = %status, "Service has been turned {}", status);
        self.remember(canonical, status);
        Ok(updated)
    }

    /// Current status of a known flag, read from the store.
    pub async fn get_flag(&self, name: &str) -> Result<Option<FlagStatus>, RegistryError> {
        let Some(canonical) = names::resolve(&self.services, name) else {
            return Ok(None);
        };
        self.store.read(canonical).await
    }

    /// Read every known flag from the store.
    ///
    /// Services without a flag document are left out of the snapshot.
    pub async fn get_all_flags(&self) -> Result<FlagSnapshot, RegistryError> {
        let mut snapshot = FlagSnapshot::new();
        for name in &self.services {
            if let Some(status) = self.store.read(name).await? {
                snapshot.insert(name.clone(), status);
            }
        }
        Ok(snapshot)
    }

    /// Last status seen for each service.
    pub fn cached(&self) -> Arc<HashMap<String, FlagStatus>> {
        self.cache.load_full()
    }

    /// Read every flag once and record it as the baseline.
    ///
    /// Missing flags are logged as inactive. A read error for one service is
    /// logged and does not stop the others.
    pub async fn load_baseline(&self) -> FlagSnapshot {
        tracing::info!("Initializing Service Registry...");
        let mut snapshot = FlagSnapshot::new();
        for name in &self.services {
            match self.store.read(name).await {
                Ok(status) => {
                    let status = status.unwrap_or(FlagStatus::Off);
                    tracing::info!(service = %name, "-> {}: {}", name, status.label());
                    self.remember(name, status);
                    snapshot.insert(name.clone(), status);
                }
                Err(e) => tracing::warn!(service = %name, error = %e, "Could not read service flag"),
            }
        }
        tracing::info!("Service Registry Initialization Complete.");
        snapshot
    }

    /// Record an observed status; returns the previously cached one.
    pub(crate) fn remember(&self, name: &str, status: FlagStatus) -> Option<FlagStatus> {
        let mut previous = None;
        self.cache.rcu(|current| {
            let mut next = HashMap::clone(current);
            previous = next.insert(name.to_string(), status);
            next
        });
        metrics::record_service_flag(name, status);
        previous
    }

    async fn set_category(&self, category: FailureCategory, status: FlagStatus) -> Result<(), BoxError> {
        let flags = self.categories.flags(category);
        if flags.is_empty() {
            tracing::warn!(category = %category, "No flag actions defined for failure category");
            return Ok(());
        }

        let results = join_all(flags.iter().map(|name| self.set_flag(name, status))).await;
        let failed: Vec<String> = flags
            .iter()
            .zip(results)
            .filter_map(|(name, result)| result.err().map(|e| format!("{name}: {e}")))
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(failed.join("; ").into())
        }
    }
}

#[async_trait]
impl FlagEffects for ServiceRegistry {
    async fn turn_on(&self, category: FailureCategory) -> Result<(), BoxError> {
        self.set_category(category, FlagStatus::On).await
    }

    async fn turn_off(&self, category: FailureCategory) -> Result<(), BoxError> {
        self.set_category(category, FlagStatus::Off).await
    }
}
