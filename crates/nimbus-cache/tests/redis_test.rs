//! Integration tests for the Redis backend.
//!
//! These tests run against a real Redis server using testcontainers.
//! Requires Docker to be available on the system.

use nimbus_cache::{CacheError, CacheProvider, HandleState, RedisCacheFactory};
use nimbus_config::RedisConfig;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::{Redis, REDIS_PORT};

/// Redis container wrapper.
struct TestRedis {
    _container: ContainerAsync<Redis>,
    config: RedisConfig,
}

impl TestRedis {
    async fn new() -> Self {
        let container = Redis::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(REDIS_PORT)
            .await
            .expect("Failed to get Redis port");

        let config = RedisConfig {
            url: format!("redis://127.0.0.1:{}", port),
            pool_size: 4,
            ..RedisConfig::default()
        };

        Self {
            _container: container,
            config,
        }
    }

    fn provider(&self, region: &str) -> CacheProvider {
        let factory = Arc::new(RedisCacheFactory::new(self.config.clone()));
        CacheProvider::new(factory, region)
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_session_scenario() {
    let redis = TestRedis::new().await;
    let cache = redis.provider("default");

    cache.set("session:42", "2024-01-01T00:00:00Z").await.unwrap();
    assert_eq!(cache.state(), HandleState::Ready);

    let value: Option<String> = cache.get("session:42").await.unwrap();
    assert_eq!(value.as_deref(), Some("2024-01-01T00:00:00Z"));

    assert!(cache.remove("session:42").await.unwrap());
    assert!(!cache.remove("session:42").await.unwrap());
    assert!(cache.get::<String>("session:42").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_add_rejects_duplicate() {
    let redis = TestRedis::new().await;
    let cache = redis.provider("default");

    cache.add("k", &1).await.unwrap();
    let err = cache.add("k", &2).await.unwrap_err();

    assert!(matches!(err, CacheError::KeyAlreadyExists(_)));
    assert_eq!(cache.get::<i32>("k").await.unwrap(), Some(1));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_add_with_timeout_expires() {
    let redis = TestRedis::new().await;
    let cache = redis.provider("default");

    cache
        .add_with_timeout("token", "abc", Duration::from_millis(300))
        .await
        .unwrap();
    assert!(cache.exists("token").await.unwrap());

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(cache.get::<String>("token").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_regions_are_isolated() {
    let redis = TestRedis::new().await;
    let sessions = redis.provider("sessions");
    let tokens = redis.provider("tokens");

    sessions.set("k", "session").await.unwrap();
    tokens.set("k", "token").await.unwrap();

    assert_eq!(sessions.get::<String>("k").await.unwrap().as_deref(), Some("session"));
    assert_eq!(tokens.get::<String>("k").await.unwrap().as_deref(), Some("token"));
    sessions.health_check().await.unwrap();
}
