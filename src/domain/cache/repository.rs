//! Cache trait definition

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info, warn};

use super::error::CacheError;

/// Key-value cache holding serialized records.
///
/// Entries never expire on their own: they persist until overwritten or
/// evicted by the backend's memory policy.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets the raw bytes stored under `key`
    async fn get_raw(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Stores raw bytes under `key` without expiration
    async fn set_raw(&self, key: &str, value: Bytes) -> Result<(), CacheError>;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    /// Releases pooled resources. Called once at shutdown.
    async fn close(&self) {}
}

/// Best-effort accessors used on the request path.
///
/// Neither method can fail: errors and timeouts are logged, counted and
/// collapsed into a miss (`None`) or an unsuccessful write (`false`).
pub trait CacheExt: Cache {
    /// Reads `key`, bounded by `timeout`
    fn fetch<'a>(
        &'a self,
        key: &'a str,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Option<Bytes>> + Send + 'a {
        async move {
            let result = match tokio::time::timeout(timeout, self.get_raw(key)).await {
                Ok(result) => result,
                Err(_) => Err(CacheError::Timeout(timeout)),
            };

            match result {
                Ok(Some(value)) => {
                    info!(key = %key, "Item found in cache");
                    Some(value)
                }
                Ok(None) => {
                    info!(key = %key, "Item not in cache");
                    None
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Error checking cache, treating as miss");
                    metrics::counter!("lookup_cache_errors_total", "op" => "get", "kind" => e.kind())
                        .increment(1);
                    None
                }
            }
        }
    }

    /// Writes `value` under `key`, bounded by `timeout`
    fn put<'a>(
        &'a self,
        key: &'a str,
        value: Bytes,
        timeout: Duration,
    ) -> impl std::future::Future<Output = bool> + Send + 'a {
        async move {
            let result = match tokio::time::timeout(timeout, self.set_raw(key, value)).await {
                Ok(result) => result,
                Err(_) => Err(CacheError::Timeout(timeout)),
            };

            match result {
                Ok(()) => {
                    debug!(key = %key, "Cached item");
                    true
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Error caching item");
                    metrics::counter!("lookup_cache_errors_total", "op" => "set", "kind" => e.kind())
                        .increment(1);
                    false
                }
            }
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct StalledCache;

    #[async_trait]
    impl Cache for StalledCache {
        async fn get_raw(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }

        async fn set_raw(&self, _key: &str, _value: Bytes) -> Result<(), CacheError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fetch_hit() {
        let mut cache = MockCache::new();
        cache
            .expect_get_raw()
            .withf(|key| key == "volcano-42")
            .times(1)
            .returning(|_| Ok(Some(Bytes::from_static(b"{\"name\":\"Mt. Example\"}"))));

        let value = cache.fetch("volcano-42", Duration::from_secs(1)).await;
        assert_eq!(value, Some(Bytes::from_static(b"{\"name\":\"Mt. Example\"}")));
    }

    #[tokio::test]
    async fn test_fetch_error_is_miss() {
        let mut cache = MockCache::new();
        cache
            .expect_get_raw()
            .returning(|_| Err(CacheError::connection("connection refused")));

        assert!(cache.fetch("key", Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_miss() {
        let cache = StalledCache;

        let value = cache.fetch("key", Duration::from_millis(20)).await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_put_success() {
        let mut cache = MockCache::new();
        cache
            .expect_set_raw()
            .withf(|key, value| key == "key" && *value == Bytes::from_static(b"{}"))
            .times(1)
            .returning(|_, _| Ok(()));

        assert!(cache.put("key", Bytes::from_static(b"{}"), Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_put_failure_is_swallowed() {
        let mut cache = MockCache::new();
        cache
            .expect_set_raw()
            .returning(|_, _| Err(CacheError::command("READONLY")));

        assert!(!cache.put("key", Bytes::from_static(b"{}"), Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_put_timeout_is_swallowed() {
        let cache = StalledCache;

        let stored = cache
            .put("key", Bytes::from_static(b"{}"), Duration::from_millis(20))
            .await;
        assert!(!stored);
    }
}
