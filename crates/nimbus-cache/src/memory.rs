//! In-process cache backend built on moka.
//!
//! Regions live inside the factory, so every handle opened on the same
//! factory sees the same entries. Useful for local development and tests.

use crate::region::{CacheFactory, CacheRegion};
use crate::Ttl;
use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use moka::Expiry;
use nimbus_config::MemoryConfig;
use nimbus_core::{CacheError, CacheResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Option<Duration>,
}

/// Expires each entry after its own TTL; entries without one never expire.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite replaces the old deadline, including clearing it.
        value.ttl
    }
}

/// A region stored in this process.
pub struct MemoryRegion {
    name: String,
    cache: Cache<String, Entry>,
}

impl MemoryRegion {
    /// Create a region holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(name: impl Into<String>, max_capacity: u64) -> Self {
        let name = name.into();
        let cache = Cache::builder()
            .name(&name)
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { name, cache }
    }
}

#[async_trait]
impl CacheRegion for MemoryRegion {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, key: &str, value: &str, ttl: Option<Ttl>) -> CacheResult<()> {
        let entry = Entry {
            value: value.to_string(),
            ttl: ttl.map(Ttl::as_duration),
        };

        let stored = self
            .cache
            .entry_by_ref(key)
            .or_insert_with(async move { entry })
            .await;

        if stored.is_fresh() {
            debug!("Added key '{}' to region '{}'", key, self.name);
            Ok(())
        } else {
            Err(CacheError::key_exists(key))
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = self.cache.get(key).await.map(|entry| entry.value);

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> CacheResult<()> {
        let entry = Entry {
            value: value.to_string(),
            ttl: None,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let result = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|existing| {
                let op = if existing.is_some() { Op::Remove } else { Op::Nop };
                std::future::ready(op)
            })
            .await;

        Ok(matches!(result, CompResult::Removed(_)))
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("name", &self.name)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

/// Factory for in-process regions.
pub struct MemoryCacheFactory {
    config: MemoryConfig,
    regions: Mutex<HashMap<String, Arc<MemoryRegion>>>,
}

impl MemoryCacheFactory {
    /// Create a factory whose regions use `config`.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            regions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCacheFactory {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

#[async_trait]
impl CacheFactory for MemoryCacheFactory {
    async fn get_cache(&self, region: &str) -> CacheResult<Arc<dyn CacheRegion>> {
        let mut regions = self.regions.lock();
        let region: Arc<dyn CacheRegion> = regions
            .entry(region.to_string())
            .or_insert_with(|| Arc::new(MemoryRegion::new(region, self.config.max_capacity)))
            .clone();
        Ok(region)
    }
}
