//! Redis-backed cache regions.

use crate::region::{CacheFactory, CacheRegion};
use crate::Ttl;
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use nimbus_config::RedisConfig;
use nimbus_core::{CacheError, CacheResult};
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::{debug, info};

/// Create a Redis connection pool and check that the server answers.
pub async fn create_pool(config: &RedisConfig) -> CacheResult<Pool> {
    info!("Creating Redis connection pool...");

    let cfg = Config::from_url(&config.url);

    let pool = cfg
        .builder()
        .map_err(|e| CacheError::unavailable(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .create_timeout(Some(config.connect_timeout()))
        .wait_timeout(Some(config.wait_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| CacheError::unavailable(format!("Failed to create pool: {}", e)))?;

    // Test connection
    let mut conn = pool.get().await?;
    redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Redis key builder for one region.
///
/// Regions share a database, so every key is namespaced as
/// `{prefix}:{region}:{key}`.
#[derive(Debug, Clone)]
pub struct RegionKeys {
    namespace: String,
}

impl RegionKeys {
    /// Create a key builder for `region` under `prefix`.
    pub fn new(prefix: &str, region: &str) -> Self {
        Self {
            namespace: format!("{}:{}", prefix, region),
        }
    }

    /// Full Redis key for a cache key.
    pub fn entry(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

/// A region stored in Redis.
pub struct RedisRegion {
    name: String,
    pool: Pool,
    keys: RegionKeys,
}

impl RedisRegion {
    /// Create a region over an existing pool.
    #[must_use]
    pub fn new(pool: Pool, prefix: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        let keys = RegionKeys::new(prefix, &name);
        Self { name, pool, keys }
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl CacheRegion for RedisRegion {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, key: &str, value: &str, ttl: Option<Ttl>) -> CacheResult<()> {
        let mut conn = self.conn().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.keys.entry(key)).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl.as_millis_ceil());
        }

        // SET NX answers OK when written and nil when the key already exists.
        let reply: Option<String> = cmd.query_async(&mut *conn).await.map_err(|e| {
            CacheError::unavailable(format!("Failed to add key '{}': {}", key, e))
        })?;

        match reply {
            Some(_) => {
                debug!("Added key '{}' with TTL {:?}", key, ttl.map(Ttl::as_duration));
                Ok(())
            }
            None => Err(CacheError::key_exists(key)),
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(self.keys.entry(key)).await.map_err(|e| {
            CacheError::unavailable(format!("Failed to get key '{}': {}", key, e))
        })?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;

        // Plain SET also drops any TTL the previous value carried.
        conn.set::<_, _, ()>(self.keys.entry(key), value).await.map_err(|e| {
            CacheError::unavailable(format!("Failed to set key '{}': {}", key, e))
        })?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let deleted: i64 = conn.del(self.keys.entry(key)).await.map_err(|e| {
            CacheError::unavailable(format!("Failed to delete key '{}': {}", key, e))
        })?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let exists: bool = conn.exists(self.keys.entry(key)).await.map_err(|e| {
            CacheError::unavailable(format!("Failed to check key '{}': {}", key, e))
        })?;

        Ok(exists)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisRegion")
            .field("name", &self.name)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

/// Factory that opens regions on a Redis server.
///
/// Every [`get_cache`](CacheFactory::get_cache) call builds a fresh pool;
/// the handle initializer makes sure that happens once.
#[derive(Debug, Clone)]
pub struct RedisCacheFactory {
    config: RedisConfig,
}

impl RedisCacheFactory {
    /// Create a factory for the configured server.
    #[must_use]
    pub fn new(config: RedisConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CacheFactory for RedisCacheFactory {
    async fn get_cache(&self, region: &str) -> CacheResult<Arc<dyn CacheRegion>> {
        let pool = create_pool(&self.config).await?;
        Ok(Arc::new(RedisRegion::new(pool, &self.config.key_prefix, region)))
    }
}
