//! Facade behaviour over the in-memory backend.

mod common;

use common::{memory_provider, CountingFactory};
use nimbus_cache::{CacheError, CacheProvider, HandleState, Ttl};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user_id: u64,
    started_at: String,
}

#[tokio::test]
async fn test_session_scenario() {
    let cache = memory_provider();

    cache.set("session:42", "2024-01-01T00:00:00Z").await.unwrap();

    let value: Option<String> = cache.get("session:42").await.unwrap();
    assert_eq!(value.as_deref(), Some("2024-01-01T00:00:00Z"));

    assert!(cache.remove("session:42").await.unwrap());
    assert!(cache.get::<String>("session:42").await.unwrap().is_none());
}

#[tokio::test]
async fn test_set_then_get_structured_value() {
    let cache = memory_provider();
    let session = Session {
        user_id: 42,
        started_at: "2024-01-01T00:00:00Z".to_string(),
    };

    cache.set("session:42", &session).await.unwrap();

    let found: Session = cache.get("session:42").await.unwrap().unwrap();
    assert_eq!(found, session);
}

#[tokio::test]
async fn test_get_missing_key_is_none() {
    let cache = memory_provider();
    assert!(cache.get::<String>("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_absent_key_is_false() {
    let cache = memory_provider();
    assert!(!cache.remove("missing").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_add_keeps_first_value() {
    let cache = memory_provider();

    cache.add("counter", &1).await.unwrap();
    let err = cache.add("counter", &2).await.unwrap_err();

    assert!(matches!(err, CacheError::KeyAlreadyExists(ref key) if key == "counter"));
    assert_eq!(cache.get::<i32>("counter").await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_add_with_timeout_expires() {
    let cache = memory_provider();

    cache
        .add_with_timeout("token", "abc", Duration::from_millis(200))
        .await
        .unwrap();
    assert_eq!(cache.get::<String>("token").await.unwrap().as_deref(), Some("abc"));

    sleep(Duration::from_millis(600)).await;
    assert!(cache.get::<String>("token").await.unwrap().is_none());
    assert!(!cache.exists("token").await.unwrap());
}

#[tokio::test]
async fn test_add_with_timeout_accepts_chrono_and_ttl() {
    let cache = memory_provider();

    cache
        .add_with_timeout("a", &1, chrono::Duration::seconds(30))
        .await
        .unwrap();
    cache
        .add_with_timeout("b", &2, Ttl::from_secs(30).unwrap())
        .await
        .unwrap();

    assert_eq!(cache.get::<i32>("a").await.unwrap(), Some(1));
    assert_eq!(cache.get::<i32>("b").await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_non_positive_timeout_is_rejected_before_connecting() {
    let factory = Arc::new(CountingFactory::new(Duration::ZERO));
    let cache = CacheProvider::new(factory.clone(), "default");

    let err = cache
        .add_with_timeout("k", "v", Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));

    let err = cache
        .add_with_timeout("k", "v", chrono::Duration::milliseconds(-500))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));

    assert_eq!(factory.attempts(), 0);
    assert_eq!(cache.state(), HandleState::Uninitialized);

    // Nothing was written.
    assert!(!cache.exists("k").await.unwrap());
}

#[tokio::test]
async fn test_oversized_timeout_is_rejected_before_connecting() {
    let factory = Arc::new(CountingFactory::new(Duration::ZERO));
    let cache = CacheProvider::new(factory.clone(), "default");

    let err = cache
        .add_with_timeout("k", "v", Duration::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));
    assert!(!err.is_retriable());

    let err = cache
        .add_with_timeout("k", "v", chrono::Duration::days(365 * 200))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));

    assert_eq!(factory.attempts(), 0);
    assert_eq!(cache.state(), HandleState::Uninitialized);
}

#[tokio::test]
async fn test_set_overwrites_and_clears_timeout() {
    let cache = memory_provider();

    cache
        .add_with_timeout("k", "short-lived", Duration::from_millis(200))
        .await
        .unwrap();
    cache.set("k", "kept").await.unwrap();

    sleep(Duration::from_millis(600)).await;
    assert_eq!(cache.get::<String>("k").await.unwrap().as_deref(), Some("kept"));
}

#[tokio::test]
async fn test_type_mismatch_is_serialization_error() {
    let cache = memory_provider();
    cache.set("k", "not a number").await.unwrap();

    let err = cache.get::<u64>("k").await.unwrap_err();
    assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
}

#[tokio::test]
async fn test_null_value_is_rejected() {
    let cache = memory_provider();

    let err = cache.set("k", &Option::<String>::None).await.unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));
    assert!(!cache.exists("k").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_connects_once() {
    let factory = Arc::new(CountingFactory::new(Duration::from_millis(100)));
    let cache = CacheProvider::new(factory.clone(), "default");

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.set(&format!("key:{}", i), &i).await })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(factory.attempts(), 1);
    assert_eq!(cache.state(), HandleState::Ready);
    assert_eq!(cache.get::<i32>("key:7").await.unwrap(), Some(7));
}

#[tokio::test]
async fn test_state_is_initializing_during_connect() {
    let factory = Arc::new(CountingFactory::new(Duration::from_millis(300)));
    let cache = CacheProvider::new(factory.clone(), "default");

    let pending = tokio::spawn({
        let cache = cache.clone();
        async move { cache.health_check().await }
    });

    sleep(Duration::from_millis(100)).await;
    assert_eq!(cache.state(), HandleState::Initializing);

    pending.await.unwrap().unwrap();
    assert_eq!(cache.state(), HandleState::Ready);
}

#[tokio::test]
async fn test_failed_connect_is_retried_on_next_call() {
    let factory = Arc::new(CountingFactory::failing(1, Duration::ZERO));
    let cache = CacheProvider::new(factory.clone(), "default");

    let err = cache.set("k", "v").await.unwrap_err();
    assert!(err.is_retriable());
    assert_eq!(cache.state(), HandleState::Uninitialized);

    cache.set("k", "v").await.unwrap();
    assert_eq!(factory.attempts(), 2);
    assert_eq!(cache.state(), HandleState::Ready);
}

#[tokio::test]
async fn test_get_or_add_with_computes_once() {
    let cache = memory_provider();

    let first: String = cache
        .get_or_add_with("greeting", Duration::from_secs(30), || async {
            Ok("hello".to_string())
        })
        .await
        .unwrap();

    let second: String = cache
        .get_or_add_with("greeting", Duration::from_secs(30), || async {
            Ok("recomputed".to_string())
        })
        .await
        .unwrap();

    assert_eq!(first, "hello");
    assert_eq!(second, "hello");
}

#[tokio::test]
async fn test_get_or_add_with_prefers_concurrently_added_value() {
    let cache = memory_provider();

    let value: String = cache
        .get_or_add_with("greeting", Duration::from_secs(30), || {
            let cache = cache.clone();
            async move {
                // Another writer wins the race while the value is computed.
                cache.add("greeting", "first").await?;
                Ok::<_, CacheError>("second".to_string())
            }
        })
        .await
        .unwrap();

    assert_eq!(value, "first");
}

#[tokio::test]
async fn test_get_or_add_with_propagates_factory_error() {
    let cache = memory_provider();

    let err = cache
        .get_or_add_with::<String, _, _, _>("k", Duration::from_secs(30), || async {
            Err(CacheError::unavailable("upstream down"))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::CacheUnavailable(_)));
    assert!(!cache.exists("k").await.unwrap());
}

#[tokio::test]
async fn test_clones_share_one_handle() {
    let cache = memory_provider();
    let clone = cache.clone();

    cache.set("shared", &true).await.unwrap();
    assert_eq!(clone.get::<bool>("shared").await.unwrap(), Some(true));
    assert_eq!(clone.state(), HandleState::Ready);
}
