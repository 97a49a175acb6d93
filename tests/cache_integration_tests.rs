//! Integration tests for the article cache
//!
//! These tests drive the public facade end to end:
//! - Capacity bound and LRU eviction
//! - TTL expiration
//! - Recently viewed ledger semantics
//! - Restore from durable storage
//! - Best-effort persistence when storage fails
//! - Metrics

use article_cache::{
    ArticleDetail, ArticleDetailCache, ArticleSource, CacheConfig, CacheError, DurableStorage,
    ManualClock, MemoryStorage, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

fn article(uri: &str, title: &str) -> ArticleDetail {
    ArticleDetail {
        uri: uri.to_string(),
        title: title.to_string(),
        body: format!("Body of {}", title),
        image: format!("https://images.example.com/{}.png", uri),
        url: format!("https://news.example.com/{}", uri),
        date_time: "2024-05-01T10:00:00Z".to_string(),
        source: ArticleSource {
            title: "Example Wire".to_string(),
        },
    }
}

fn new_cache(storage: &MemoryStorage) -> (ArticleDetailCache, ManualClock) {
    let clock = ManualClock::new();
    let cache = ArticleDetailCache::with_clock(
        CacheConfig::default(),
        Arc::new(storage.clone()),
        Arc::new(clock.clone()),
    )
    .unwrap();
    (cache, clock)
}

async fn ledger_uris(cache: &ArticleDetailCache) -> Vec<String> {
    cache
        .recently_viewed()
        .await
        .into_iter()
        .map(|a| a.uri)
        .collect()
}

/// Storage that can be read but rejects every write
#[derive(Debug)]
struct ReadOnlyStorage {
    inner: MemoryStorage,
}

#[async_trait]
impl DurableStorage for ReadOnlyStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, _value: Vec<u8>) -> Result<()> {
        Err(CacheError::storage(key, "read-only"))
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Err(CacheError::storage(key, "read-only"))
    }
}

/// Storage whose reads always fail
#[derive(Debug, Default)]
struct UnreadableStorage;

#[async_trait]
impl DurableStorage for UnreadableStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Err(CacheError::storage(key, "disk unreadable"))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_capacity_evicts_least_recently_used() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);

    for i in 1..=11 {
        let uri = format!("u{}", i);
        cache.write(&uri, article(&uri, &uri)).await;
    }

    assert_eq!(cache.read("u1").await, None);
    for i in 2..=11 {
        assert!(cache.read(&format!("u{}", i)).await.is_some(), "u{} missing", i);
    }

    let store = cache.store_stats().await;
    assert_eq!(store.entries, 10);
    assert_eq!(store.evictions_capacity, 1);

    // Ledger holds the 10 newest, newest first
    let expected: Vec<String> = (2..=11).rev().map(|i| format!("u{}", i)).collect();
    assert_eq!(ledger_uris(&cache).await, expected);
}

#[tokio::test]
async fn test_read_refreshes_recency() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);

    for i in 1..=10 {
        let uri = format!("u{}", i);
        cache.write(&uri, article(&uri, &uri)).await;
    }

    // Touch u1 so u2 becomes the eviction candidate
    assert!(cache.read("u1").await.is_some());
    cache.write("u11", article("u11", "u11")).await;

    assert!(cache.contains("u1").await);
    assert!(!cache.contains("u2").await);
}

#[tokio::test]
async fn test_ttl_expiration() {
    let storage = MemoryStorage::new();
    let (cache, clock) = new_cache(&storage);

    cache.write("u1", article("u1", "A")).await;

    clock.advance(Duration::from_secs(9 * 60));
    assert!(cache.read("u1").await.is_some());

    // Reads do not extend the lifetime
    clock.advance(Duration::from_secs(2 * 60));
    assert_eq!(cache.read("u1").await, None);

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_entry_at_exact_ttl_is_still_served() {
    let storage = MemoryStorage::new();
    let (cache, clock) = new_cache(&storage);

    cache.write("u1", article("u1", "A")).await;
    clock.advance(Duration::from_secs(600));

    assert!(cache.read("u1").await.is_some());
}

#[tokio::test]
async fn test_second_write_updates_store_not_ledger() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);

    cache.write("u1", article("u1", "A")).await;
    cache.write("u1", article("u1", "B")).await;

    assert_eq!(cache.read("u1").await.unwrap().title, "B");

    let recent = cache.recently_viewed().await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "A");
}

#[tokio::test]
async fn test_write_prepends_to_ledger() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);

    cache.write("a", article("a", "A")).await;
    cache.write("b", article("b", "B")).await;
    cache.write("a", article("a", "A2")).await;

    assert_eq!(ledger_uris(&cache).await, vec!["b", "a"]);
}

#[tokio::test]
async fn test_restore_from_durable_storage() {
    let storage = MemoryStorage::new();
    let ledger = vec![article("uriX", "A"), article("uriY", "B")];
    storage
        .set(
            "recently_viewed_articles",
            serde_json::to_vec(&ledger).unwrap(),
        )
        .await
        .unwrap();

    let (cache, _clock) = new_cache(&storage);
    assert_eq!(cache.restore_from_durable_storage().await, 2);

    assert_eq!(cache.recently_viewed().await, ledger);
    assert_eq!(cache.read("uriX").await.unwrap().title, "A");
    assert_eq!(cache.stats().await.hits, 1);
}

#[tokio::test]
async fn test_restore_survives_restart() {
    let storage = MemoryStorage::new();

    let (first, _clock) = new_cache(&storage);
    first.write("a", article("a", "A")).await;
    first.write("b", article("b", "B")).await;
    first.shutdown().await.unwrap();

    let (second, _clock) = new_cache(&storage);
    second.restore_from_durable_storage().await;

    assert_eq!(ledger_uris(&second).await, vec!["b", "a"]);
    assert!(second.read("a").await.is_some());
}

#[tokio::test]
async fn test_restore_ignores_missing_and_malformed_data() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);

    assert_eq!(cache.restore_from_durable_storage().await, 0);

    storage
        .set("recently_viewed_articles", b"{not json".to_vec())
        .await
        .unwrap();
    assert_eq!(cache.restore_from_durable_storage().await, 0);

    storage
        .set("recently_viewed_articles", b"[]".to_vec())
        .await
        .unwrap();
    assert_eq!(cache.restore_from_durable_storage().await, 0);

    assert!(cache.recently_viewed().await.is_empty());
    assert_eq!(cache.store_stats().await.entries, 0);
}

#[tokio::test]
async fn test_restore_with_unreadable_storage_leaves_cache_empty() {
    let cache =
        ArticleDetailCache::new(CacheConfig::default(), Arc::new(UnreadableStorage)).unwrap();

    assert_eq!(cache.restore_from_durable_storage().await, 0);
    assert!(cache.recently_viewed().await.is_empty());
    assert_eq!(cache.store_stats().await.entries, 0);

    // The cache stays usable afterwards
    cache.write("u1", article("u1", "A")).await;
    assert!(cache.read("u1").await.is_some());
}

#[tokio::test]
async fn test_restore_tolerates_null_fields() {
    let storage = MemoryStorage::new();
    storage
        .set(
            "recently_viewed_articles",
            br#"[{"uri":"x","title":"X","image":null,"body":"b","url":"u","dateTime":"d","source":{"title":"S"}}]"#.to_vec(),
        )
        .await
        .unwrap();

    let (cache, _clock) = new_cache(&storage);
    assert_eq!(cache.restore_from_durable_storage().await, 1);
    assert_eq!(cache.read("x").await.unwrap().image, "");
}

#[tokio::test]
async fn test_restore_dedupes_and_truncates() {
    let storage = MemoryStorage::new();
    let mut ledger: Vec<ArticleDetail> = (0..12)
        .map(|i| article(&format!("u{}", i), "T"))
        .collect();
    ledger.insert(1, article("u0", "duplicate"));
    storage
        .set(
            "recently_viewed_articles",
            serde_json::to_vec(&ledger).unwrap(),
        )
        .await
        .unwrap();

    let (cache, _clock) = new_cache(&storage);
    assert_eq!(cache.restore_from_durable_storage().await, 10);

    let recent = cache.recently_viewed().await;
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].title, "T");
    assert_eq!(recent[9].uri, "u9");
}

#[tokio::test]
async fn test_failed_persistence_keeps_memory_state() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);
    storage.fail_writes(true);

    cache.write("u1", article("u1", "A")).await;
    cache.flush().await.unwrap();

    assert!(cache.read("u1").await.is_some());
    assert_eq!(ledger_uris(&cache).await, vec!["u1"]);
    assert_eq!(cache.failed_persists(), 2);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_read_only_storage_still_restores() {
    let inner = MemoryStorage::new();
    inner
        .set(
            "recently_viewed_articles",
            serde_json::to_vec(&vec![article("x", "X")]).unwrap(),
        )
        .await
        .unwrap();

    let cache = ArticleDetailCache::new(
        CacheConfig::default(),
        Arc::new(ReadOnlyStorage { inner }),
    )
    .unwrap();

    assert_eq!(cache.restore_from_durable_storage().await, 1);
    cache.write("y", article("y", "Y")).await;
    cache.flush().await.unwrap();

    assert_eq!(ledger_uris(&cache).await, vec!["y", "x"]);
    assert!(cache.failed_persists() > 0);
}

#[tokio::test]
async fn test_hit_and_miss_rates_sum_to_one() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);

    cache.read("a").await;
    cache.write("a", article("a", "A")).await;
    cache.read("a").await;
    cache.read("a").await;
    cache.read("b").await;

    let stats = cache.stats().await;
    assert_eq!(stats.total_requests, 4);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 2);
    assert!((stats.hit_rate + stats.miss_rate - 1.0).abs() < 1e-9);
    assert_eq!(stats.latency_samples, 4);
    assert!(stats.avg_latency_ms >= 0.0);
}

#[tokio::test]
async fn test_payload_size_is_sampled_per_write() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);

    let detail = article("a", "A");
    let expected = serde_json::to_vec(&detail).unwrap().len() as f64;
    cache.write("a", detail).await;

    let stats = cache.stats().await;
    assert_eq!(stats.memory_samples, 1);
    assert_eq!(stats.avg_memory_bytes, expected);
    // Writes are not requests
    assert_eq!(stats.total_requests, 0);
}

#[tokio::test]
async fn test_concurrent_writes_keep_invariants() {
    let storage = MemoryStorage::new();
    let (cache, _clock) = new_cache(&storage);
    let cache = Arc::new(cache);

    let writes = (0..40).map(|i| {
        let cache = cache.clone();
        async move {
            let uri = format!("u{}", i % 15);
            cache.write(&uri, article(&uri, "T")).await;
        }
    });
    futures::future::join_all(writes).await;
    cache.flush().await.unwrap();

    let recent = cache.recently_viewed().await;
    assert_eq!(recent.len(), 10);
    let mut uris: Vec<&str> = recent.iter().map(|a| a.uri.as_str()).collect();
    uris.sort();
    uris.dedup();
    assert_eq!(uris.len(), 10);

    // The persisted ledger matches memory
    let blob = storage
        .get("recently_viewed_articles")
        .await
        .unwrap()
        .unwrap();
    let persisted: Vec<ArticleDetail> = serde_json::from_slice(&blob).unwrap();
    assert_eq!(persisted, recent);
}
