//! Read-through record lookup

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::{CachePopulation, CacheSettings, LookupConfig, StoreSettings};
use crate::domain::{
    Cache, CacheExt, LookupKey, LookupOutcome, RecordOrigin, RecordStore, StoreError,
};
use crate::infrastructure::observability::{
    record_cache_hit, record_cache_miss, record_lookup, record_store_error,
};

/// Timeouts and policy switches for the lookup path
#[derive(Debug, Clone)]
pub struct LookupServiceConfig {
    /// Bound on each cache get and set
    pub cache_timeout: Duration,
    /// Bound on each store read
    pub store_timeout: Duration,
    pub population: CachePopulation,
    /// Report store faults as `StoreUnavailable` instead of `NotFound`
    pub distinguish_store_unavailable: bool,
}

impl Default for LookupServiceConfig {
    fn default() -> Self {
        Self {
            cache_timeout: Duration::from_secs(1),
            store_timeout: Duration::from_secs(5),
            population: CachePopulation::Inline,
            distinguish_store_unavailable: false,
        }
    }
}

impl LookupServiceConfig {
    pub fn from_settings(lookup: &LookupConfig, cache: &CacheSettings, store: &StoreSettings) -> Self {
        Self {
            // Connection checkout and the round trip both fall under one cache call
            cache_timeout: cache.wait_timeout().max(cache.connect_timeout())
                + cache.operation_timeout(),
            store_timeout: store.timeout(),
            population: lookup.cache_population,
            distinguish_store_unavailable: lookup.distinguish_store_unavailable,
        }
    }

    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_population(mut self, population: CachePopulation) -> Self {
        self.population = population;
        self
    }

    pub fn distinguishing_store_unavailable(mut self) -> Self {
        self.distinguish_store_unavailable = true;
        self
    }
}

/// Answers lookups from the cache when possible and from the store otherwise.
///
/// The cache is best-effort throughout: read failures count as misses and
/// write failures are logged and dropped, so a cache outage only costs
/// latency. A store hit is written back to the cache exactly once, with the
/// same bytes that are returned to the caller.
pub struct LookupService {
    cache: Arc<dyn Cache>,
    store: Arc<dyn RecordStore>,
    config: LookupServiceConfig,
}

impl std::fmt::Debug for LookupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupService")
            .field("config", &self.config)
            .finish()
    }
}

impl LookupService {
    pub fn new(cache: Arc<dyn Cache>, store: Arc<dyn RecordStore>) -> Self {
        Self::with_config(cache, store, LookupServiceConfig::default())
    }

    pub fn with_config(
        cache: Arc<dyn Cache>,
        store: Arc<dyn RecordStore>,
        config: LookupServiceConfig,
    ) -> Self {
        Self {
            cache,
            store,
            config,
        }
    }

    pub fn config(&self) -> &LookupServiceConfig {
        &self.config
    }

    /// Looks up the record for a raw, possibly absent, key.
    ///
    /// Never fails: every path, including a panic inside a dependency,
    /// resolves to a `LookupOutcome`.
    pub async fn lookup(&self, raw_key: Option<&str>) -> LookupOutcome {
        let started = Instant::now();

        let outcome = match LookupKey::parse(raw_key) {
            Ok(key) => match AssertUnwindSafe(self.resolve(&key)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    error!(
                        key = %key,
                        panic = panic_message(panic.as_ref()),
                        "Unexpected fault during lookup"
                    );
                    LookupOutcome::SystemError
                }
            },
            Err(e) => {
                debug!(error = %e, "Rejected lookup");
                LookupOutcome::InvalidInput
            }
        };

        record_lookup(&outcome, started.elapsed());
        outcome
    }

    async fn resolve(&self, key: &LookupKey) -> LookupOutcome {
        if let Some(payload) = self.cache.fetch(key.as_str(), self.config.cache_timeout).await {
            record_cache_hit();
            return LookupOutcome::found(payload, RecordOrigin::Cache);
        }
        record_cache_miss();

        let record = match self.read_store(key).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                info!(key = %key, "Record not in store");
                return LookupOutcome::NotFound;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Store read failed");
                record_store_error(&e);
                return if self.config.distinguish_store_unavailable {
                    LookupOutcome::StoreUnavailable
                } else {
                    LookupOutcome::NotFound
                };
            }
        };

        let payload = match serde_json::to_vec(&record) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to serialize record");
                return LookupOutcome::SystemError;
            }
        };

        self.populate(key, payload.clone()).await;

        LookupOutcome::found(payload, RecordOrigin::Store)
    }

    async fn read_store(&self, key: &LookupKey) -> Result<crate::domain::Record, StoreError> {
        match tokio::time::timeout(self.config.store_timeout, self.store.read_by_key(key)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::timeout(self.config.store_timeout)),
        }
    }

    async fn populate(&self, key: &LookupKey, payload: Bytes) {
        let timeout = self.config.cache_timeout;

        match self.config.population {
            CachePopulation::Inline => {
                self.cache.put(key.as_str(), payload, timeout).await;
            }
            CachePopulation::Background => {
                let cache = Arc::clone(&self.cache);
                let key = key.as_str().to_string();
                tokio::spawn(async move {
                    cache.put(&key, payload, timeout).await;
                });
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::store::MockRecordStore;
    use crate::domain::{CacheError, Record};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::store::InMemoryRecordStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a store and counts reads
    struct CountingStore {
        inner: InMemoryRecordStore,
        reads: AtomicUsize,
    }

    impl CountingStore {
        fn with_volcano() -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryRecordStore::with_records([(
                    "volcano-42",
                    json!({"name": "Mt. Example", "elevation": 123}),
                )]),
                reads: AtomicUsize::new(0),
            })
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn read_by_key(&self, key: &LookupKey) -> Result<Record, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_by_key(key).await
        }
    }

    struct PanickingStore;

    #[async_trait]
    impl RecordStore for PanickingStore {
        async fn read_by_key(&self, _key: &LookupKey) -> Result<Record, StoreError> {
            panic!("driver bug")
        }
    }

    struct SlowStore;

    #[async_trait]
    impl RecordStore for SlowStore {
        async fn read_by_key(&self, _key: &LookupKey) -> Result<Record, StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(json!({}))
        }
    }

    fn fast_config() -> LookupServiceConfig {
        LookupServiceConfig::default()
            .with_cache_timeout(Duration::from_millis(50))
            .with_store_timeout(Duration::from_millis(50))
    }

    fn volcano_bytes() -> Bytes {
        Bytes::from(serde_json::to_vec(&json!({"name": "Mt. Example", "elevation": 123})).unwrap())
    }

    #[tokio::test]
    async fn test_store_hit_populates_cache_then_serves_from_cache() {
        let cache = Arc::new(InMemoryCache::new());
        let store = CountingStore::with_volcano();
        let service = LookupService::with_config(cache.clone(), store.clone(), fast_config());

        let first = service.lookup(Some("volcano-42")).await;
        assert_eq!(first, LookupOutcome::found(volcano_bytes(), RecordOrigin::Store));
        assert_eq!(store.reads(), 1);
        assert_eq!(cache.len().await, 1);

        let second = service.lookup(Some("volcano-42")).await;
        assert_eq!(second, LookupOutcome::found(volcano_bytes(), RecordOrigin::Cache));
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_cached_bytes_match_store_record() {
        let cache = Arc::new(InMemoryCache::new());
        let service =
            LookupService::with_config(cache.clone(), CountingStore::with_volcano(), fast_config());

        service.lookup(Some("volcano-42")).await;

        let cached = cache.get_raw("volcano-42").await.unwrap().unwrap();
        let decoded: Record = serde_json::from_slice(&cached).unwrap();
        assert_eq!(decoded, json!({"name": "Mt. Example", "elevation": 123}));
    }

    #[tokio::test]
    async fn test_repeated_lookups_return_identical_payloads() {
        let service = LookupService::with_config(
            Arc::new(InMemoryCache::new()),
            CountingStore::with_volcano(),
            fast_config(),
        );

        let mut payloads = Vec::new();
        for _ in 0..3 {
            match service.lookup(Some("volcano-42")).await {
                LookupOutcome::Found { payload, .. } => payloads.push(payload),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        assert!(payloads.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found_without_cache_write() {
        let mut cache = MockCache::new();
        cache.expect_get_raw().times(1).returning(|_| Ok(None));
        cache.expect_set_raw().times(0);

        let service = LookupService::with_config(
            Arc::new(cache),
            CountingStore::with_volcano(),
            fast_config(),
        );

        assert_eq!(service.lookup(Some("missing-999")).await, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_empty_key_touches_no_dependency() {
        let mut cache = MockCache::new();
        cache.expect_get_raw().times(0);
        cache.expect_set_raw().times(0);
        let mut store = MockRecordStore::new();
        store.expect_read_by_key().times(0);

        let service = LookupService::with_config(Arc::new(cache), Arc::new(store), fast_config());

        assert_eq!(service.lookup(None).await, LookupOutcome::InvalidInput);
        assert_eq!(service.lookup(Some("")).await, LookupOutcome::InvalidInput);
    }

    #[tokio::test]
    async fn test_whitespace_key_is_looked_up() {
        let mut cache = MockCache::new();
        cache
            .expect_get_raw()
            .withf(|key| key == "   ")
            .times(1)
            .returning(|_| Ok(None));
        cache.expect_set_raw().times(0);
        let mut store = MockRecordStore::new();
        store
            .expect_read_by_key()
            .withf(|key| key.as_str() == "   ")
            .times(1)
            .returning(|key| Err(StoreError::not_found(key.as_str())));

        let service = LookupService::with_config(Arc::new(cache), Arc::new(store), fast_config());

        assert_eq!(service.lookup(Some("   ")).await, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let mut cache = MockCache::new();
        cache
            .expect_get_raw()
            .withf(|key| key == "volcano-42")
            .times(1)
            .returning(|_| Ok(Some(Bytes::from_static(b"{\"cached\":true}"))));
        cache.expect_set_raw().times(0);
        let mut store = MockRecordStore::new();
        store.expect_read_by_key().times(0);

        let service = LookupService::with_config(Arc::new(cache), Arc::new(store), fast_config());

        assert_eq!(
            service.lookup(Some("volcano-42")).await,
            LookupOutcome::found(Bytes::from_static(b"{\"cached\":true}"), RecordOrigin::Cache)
        );
    }

    #[tokio::test]
    async fn test_cache_get_error_falls_back_to_store() {
        let mut cache = MockCache::new();
        cache
            .expect_get_raw()
            .returning(|_| Err(CacheError::connection("connection refused")));
        cache.expect_set_raw().times(1).returning(|_, _| Ok(()));

        let service = LookupService::with_config(
            Arc::new(cache),
            CountingStore::with_volcano(),
            fast_config(),
        );

        assert_eq!(
            service.lookup(Some("volcano-42")).await,
            LookupOutcome::found(volcano_bytes(), RecordOrigin::Store)
        );
    }

    #[tokio::test]
    async fn test_cache_set_failure_still_found() {
        let mut cache = MockCache::new();
        cache.expect_get_raw().returning(|_| Ok(None));
        cache
            .expect_set_raw()
            .withf(|key, _| key == "volcano-42")
            .times(1)
            .returning(|_, _| Err(CacheError::command("OOM command not allowed")));

        let service = LookupService::with_config(
            Arc::new(cache),
            CountingStore::with_volcano(),
            fast_config(),
        );

        let outcome = service.lookup(Some("volcano-42")).await;
        assert_eq!(outcome.origin(), Some(RecordOrigin::Store));
    }

    #[tokio::test]
    async fn test_store_error_is_not_found_by_default() {
        let mut store = MockRecordStore::new();
        store
            .expect_read_by_key()
            .times(1)
            .returning(|_| Err(StoreError::unavailable("401 Unauthorized")));

        let service = LookupService::with_config(
            Arc::new(InMemoryCache::new()),
            Arc::new(store),
            fast_config(),
        );

        assert_eq!(service.lookup(Some("volcano-42")).await, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_store_error_is_unavailable_when_distinguished() {
        let mut store = MockRecordStore::new();
        store
            .expect_read_by_key()
            .returning(|_| Err(StoreError::unavailable("connection reset")));

        let service = LookupService::with_config(
            Arc::new(InMemoryCache::new()),
            Arc::new(store),
            fast_config().distinguishing_store_unavailable(),
        );

        assert_eq!(
            service.lookup(Some("volcano-42")).await,
            LookupOutcome::StoreUnavailable
        );
        assert_eq!(service.lookup(Some("missing")).await.status_code(), 503);
    }

    #[tokio::test]
    async fn test_store_not_found_stays_404_when_distinguished() {
        let service = LookupService::with_config(
            Arc::new(InMemoryCache::new()),
            CountingStore::with_volcano(),
            fast_config().distinguishing_store_unavailable(),
        );

        assert_eq!(service.lookup(Some("missing-999")).await, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let service = LookupService::with_config(
            Arc::new(InMemoryCache::new()),
            Arc::new(SlowStore),
            fast_config().distinguishing_store_unavailable(),
        );

        let started = Instant::now();
        let outcome = service.lookup(Some("volcano-42")).await;

        assert_eq!(outcome, LookupOutcome::StoreUnavailable);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_store_panic_is_system_error() {
        let service = LookupService::with_config(
            Arc::new(InMemoryCache::new()),
            Arc::new(PanickingStore),
            fast_config(),
        );

        assert_eq!(service.lookup(Some("volcano-42")).await, LookupOutcome::SystemError);
    }

    #[tokio::test]
    async fn test_background_population() {
        let cache = Arc::new(InMemoryCache::new());
        let store = CountingStore::with_volcano();
        let service = LookupService::with_config(
            cache.clone(),
            store.clone(),
            fast_config().with_population(CachePopulation::Background),
        );

        let outcome = service.lookup(Some("volcano-42")).await;
        assert_eq!(outcome.origin(), Some(RecordOrigin::Store));

        let mut cached = None;
        for _ in 0..50 {
            cached = cache.get_raw("volcano-42").await.unwrap();
            if cached.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(cached, Some(volcano_bytes()));
        assert_eq!(store.reads(), 1);
    }

    #[test]
    fn test_config_from_settings() {
        let lookup = LookupConfig {
            distinguish_store_unavailable: true,
            cache_population: CachePopulation::Background,
            ..Default::default()
        };
        let cache = CacheSettings::default();
        let store = StoreSettings {
            timeout_ms: 750,
            ..Default::default()
        };

        let config = LookupServiceConfig::from_settings(&lookup, &cache, &store);

        assert_eq!(config.cache_timeout, Duration::from_secs(2));
        assert_eq!(config.store_timeout, Duration::from_millis(750));
        assert_eq!(config.population, CachePopulation::Background);
        assert!(config.distinguish_store_unavailable);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
