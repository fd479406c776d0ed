use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaCacheWrapper);

pub struct MokaCacheWrapper {
    inner: Cache<String, String>,
}

impl MokaCacheWrapper {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        Ok(Self::with_settings(
            config.cache.memory.max_capacity,
            config.cache.default_ttl,
        ))
    }

    pub fn with_settings(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            // 前缀失效依赖谓词失效
            .support_invalidation_closures()
            .build();

        debug!(
            "MokaCacheWrapper initialized with max capacity: {}, ttl: {}s",
            max_capacity, ttl_secs
        );
        Self { inner }
    }
}

#[async_trait]
impl ObjectCache for MokaCacheWrapper {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        if let Some(value) = self.inner.get(key).await {
            debug!("Cache hit: {}", key);
            CacheResult::Found(value)
        } else {
            debug!("Cache miss: {}", key);
            CacheResult::NotFound
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        // Moka 使用构建时的全局 TTL
        self.inner.insert(key, value).await;
        if ttl != 0 {
            debug!("Moka cache ignores per-item TTL, using global TTL configuration");
        }
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn remove_prefix(&self, prefix: &str) {
        let prefix = prefix.to_string();
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            warn!("Failed to invalidate cache entries by prefix: {}", e);
        }
        // 谓词失效是惰性的，主动跑一轮维护让 get 立即看不到旧值
        self.inner.run_pending_tasks().await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaCacheWrapper::with_settings(100, 60);
        cache.insert_raw("a".into(), "1".into(), 0).await;
        assert_eq!(cache.get_raw("a").await, CacheResult::Found("1".to_string()));
        cache.remove("a").await;
        assert_eq!(cache.get_raw("a").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_remove_prefix_keeps_other_keys() {
        let cache = MokaCacheWrapper::with_settings(100, 60);
        cache.insert_raw("q:u1:assignments:s1".into(), "[]".into(), 0).await;
        cache.insert_raw("q:u1:assignments:s2".into(), "[]".into(), 0).await;
        cache.insert_raw("q:u1:courses".into(), "[]".into(), 0).await;

        cache.remove_prefix("q:u1:assignments:").await;

        assert_eq!(cache.get_raw("q:u1:assignments:s1").await, CacheResult::NotFound);
        assert_eq!(cache.get_raw("q:u1:assignments:s2").await, CacheResult::NotFound);
        assert_eq!(
            cache.get_raw("q:u1:courses").await,
            CacheResult::Found("[]".to_string())
        );
    }
}
