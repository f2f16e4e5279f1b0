use crate::application::ports::CacheStorage;
use crate::domain::entities::{CachedResponse, Response};
use crate::domain::value_objects::CacheName;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type Entries = HashMap<String, CachedResponse>;

/// 名前付きキャッシュをメモリ上に保持する `CacheStorage`。
/// キャッシュ名は作成順ではなく辞書順で列挙される。
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    caches: Arc<RwLock<BTreeMap<String, Entries>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// キャッシュ内のエントリ数。存在しなければ `None`
    pub async fn entry_count(&self, name: &str) -> Option<usize> {
        let caches = self.caches.read().await;
        caches.get(name).map(HashMap::len)
    }

    pub async fn cached_at(&self, name: &str, url: &str) -> Option<chrono::DateTime<Utc>> {
        let caches = self.caches.read().await;
        caches
            .get(name)
            .and_then(|entries| entries.get(url))
            .map(|entry| entry.cached_at)
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &CacheName) -> Result<(), AppError> {
        let mut caches = self.caches.write().await;
        caches.entry(name.as_str().to_string()).or_default();
        Ok(())
    }

    async fn keys(&self) -> Vec<String> {
        let caches = self.caches.read().await;
        caches.keys().cloned().collect()
    }

    async fn has(&self, name: &str) -> bool {
        let caches = self.caches.read().await;
        caches.contains_key(name)
    }

    async fn delete(&self, name: &str) -> bool {
        let mut caches = self.caches.write().await;
        caches.remove(name).is_some()
    }

    async fn match_in(&self, name: &CacheName, url: &str) -> Option<Response> {
        let caches = self.caches.read().await;
        caches
            .get(name.as_str())
            .and_then(|entries| entries.get(url))
            .map(|entry| entry.response.clone())
    }

    async fn match_any(&self, url: &str) -> Option<Response> {
        let caches = self.caches.read().await;
        caches
            .values()
            .find_map(|entries| entries.get(url))
            .map(|entry| entry.response.clone())
    }

    async fn put(&self, name: &CacheName, url: &str, response: Response) -> Result<(), AppError> {
        let mut caches = self.caches.write().await;
        caches.entry(name.as_str().to_string()).or_default().insert(
            url.to_string(),
            CachedResponse {
                response,
                cached_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn put_all(
        &self,
        name: &CacheName,
        entries: Vec<(String, Response)>,
    ) -> Result<(), AppError> {
        // 書き込みロックを 1 回だけ取るので途中の状態は見えない
        let mut caches = self.caches.write().await;
        let cache = caches.entry(name.as_str().to_string()).or_default();
        let now = Utc::now();
        for (url, response) in entries {
            cache.insert(
                url,
                CachedResponse {
                    response,
                    cached_at: now,
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> CacheName {
        CacheName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn put_then_match_in_named_cache() {
        let storage = MemoryCacheStorage::new();
        let cache = name("printpoka-static-v2");

        storage
            .put(&cache, "https://shop.example/", Response::ok("home"))
            .await
            .unwrap();

        let hit = storage.match_in(&cache, "https://shop.example/").await;
        assert_eq!(hit.map(|r| r.body_text()).as_deref(), Some("home"));
        assert!(storage
            .match_in(&name("other"), "https://shop.example/")
            .await
            .is_none());
        assert!(storage
            .cached_at("printpoka-static-v2", "https://shop.example/")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn match_any_searches_every_cache() {
        let storage = MemoryCacheStorage::new();
        storage
            .put(&name("a"), "https://shop.example/x", Response::ok("x"))
            .await
            .unwrap();

        assert!(storage.match_any("https://shop.example/x").await.is_some());
        assert!(storage.match_any("https://shop.example/y").await.is_none());
    }

    #[tokio::test]
    async fn delete_removes_whole_cache() {
        let storage = MemoryCacheStorage::new();
        storage.open(&name("old-v1")).await.unwrap();
        assert!(storage.has("old-v1").await);

        assert!(storage.delete("old-v1").await);
        assert!(!storage.delete("old-v1").await);
        assert!(storage.keys().await.is_empty());
    }

    #[tokio::test]
    async fn put_all_overwrites_existing_entries() {
        let storage = MemoryCacheStorage::new();
        let cache = name("static");
        storage
            .put(&cache, "https://shop.example/", Response::ok("stale"))
            .await
            .unwrap();

        storage
            .put_all(
                &cache,
                vec![
                    ("https://shop.example/".into(), Response::ok("fresh")),
                    ("https://shop.example/offline.html".into(), Response::ok("offline")),
                ],
            )
            .await
            .unwrap();

        assert_eq!(storage.entry_count("static").await, Some(2));
        let hit = storage.match_in(&cache, "https://shop.example/").await;
        assert_eq!(hit.map(|r| r.body_text()).as_deref(), Some("fresh"));
    }
}
