//! Services registry: the named caches a server exposes.
//!
//! Built once at start-up from the configured services and shared read-only
//! afterwards, so request handling never takes a lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::config::ServiceConfig;
use crate::error::RegistryError;

use super::compact::{open_cache, CompactCache};
use super::reader::CacheReader;

/// Named compact caches, ordered by service name.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Arc<CompactCache>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every configured service.
    ///
    /// Stops at the first cache that fails to open.
    pub fn from_services(services: &[ServiceConfig]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        for service in services {
            let cache = open_cache(&service.path).map_err(|source| RegistryError::Open {
                name: service.name.clone(),
                path: service.path.display().to_string(),
                source,
            })?;

            info!(
                service = %service.name,
                path = %service.path.display(),
                dialect = cache.dialect().name(),
                format = %cache.tile_format(),
                levels = cache.metadata().lods.len(),
                "Registered MapServer service"
            );

            registry.insert(service.name.clone(), cache)?;
        }

        Ok(registry)
    }

    /// Register an already opened cache under `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        cache: CompactCache,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.services.contains_key(&name) {
            return Err(RegistryError::DuplicateService { name });
        }
        self.services.insert(name, Arc::new(cache));
        Ok(())
    }

    /// Look up a service by name.
    pub fn get(&self, name: &str) -> Option<Arc<CompactCache>> {
        self.services.get(name).cloned()
    }

    /// Service names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<CompactCache>)> {
        self.services.iter().map(|(name, cache)| (name.as_str(), cache))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
