//! Shared factories for facade integration tests.

use async_trait::async_trait;
use nimbus_cache::{
    CacheError, CacheFactory, CacheProvider, CacheRegion, CacheResult, MemoryCacheFactory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wraps the in-memory factory, counting connection attempts.
///
/// Each attempt sleeps for `delay` to widen the window for concurrent first
/// callers, and the first `failures` attempts fail as unavailable.
pub struct CountingFactory {
    inner: MemoryCacheFactory,
    attempts: AtomicUsize,
    failures: usize,
    delay: Duration,
}

impl CountingFactory {
    pub fn new(delay: Duration) -> Self {
        Self::failing(0, delay)
    }

    pub fn failing(failures: usize, delay: Duration) -> Self {
        Self {
            inner: MemoryCacheFactory::default(),
            attempts: AtomicUsize::new(0),
            failures,
            delay,
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheFactory for CountingFactory {
    async fn get_cache(&self, region: &str) -> CacheResult<Arc<dyn CacheRegion>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if attempt < self.failures {
            return Err(CacheError::unavailable("cache host unreachable"));
        }
        self.inner.get_cache(region).await
    }
}

/// A provider over a fresh in-memory region named "default".
pub fn memory_provider() -> CacheProvider {
    CacheProvider::new(Arc::new(MemoryCacheFactory::default()), "default")
}
