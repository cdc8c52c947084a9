//! Named response caches held in memory.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use tokio::sync::RwLock;

/// A stored response
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Same-origin and not redirected elsewhere
    pub basic: bool,
}

impl CachedResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Lookup key: request method plus absolute URL, optionally partitioned by
/// the caller's credentials
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: Method,
    pub url: String,
    /// SHA-256 of the credential headers; `None` for anonymous requests
    pub credentials: Option<String>,
}

impl CacheKey {
    pub fn new(method: Method, url: &url::Url) -> Self {
        Self {
            method,
            url: url.to_string(),
            credentials: None,
        }
    }

    pub fn get(url: &url::Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Restrict the entry to requests presenting the same credentials
    pub fn for_credentials(mut self, digest: Option<String>) -> Self {
        self.credentials = digest;
        self
    }
}

/// A single named cache
#[derive(Debug, Default)]
pub struct Cache {
    entries: RwLock<HashMap<CacheKey, CachedResponse>>,
}

impl Cache {
    /// Store a response, replacing any previous entry for the key
    pub async fn put(&self, key: CacheKey, response: CachedResponse) {
        self.entries.write().await.insert(key, response);
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        self.entries.read().await.get(key).cloned()
    }

    /// Keys sorted by URL
    pub async fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.read().await.keys().cloned().collect();
        keys.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.method.as_str().cmp(b.method.as_str())));
        keys
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// All caches, kept in creation order
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: RwLock<Vec<(String, Arc<Cache>)>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cache with the given name, creating it when absent
    pub async fn open(&self, name: &str) -> Arc<Cache> {
        if let Some(cache) = self.find(name).await {
            return cache;
        }

        let mut caches = self.caches.write().await;
        // Another task may have created it between the two locks.
        if let Some((_, cache)) = caches.iter().find(|(existing, _)| existing == name) {
            return Arc::clone(cache);
        }
        let cache = Arc::new(Cache::default());
        caches.push((name.to_string(), Arc::clone(&cache)));
        cache
    }

    pub async fn has(&self, name: &str) -> bool {
        self.find(name).await.is_some()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.caches
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Remove a cache; returns whether it existed
    pub async fn delete(&self, name: &str) -> bool {
        let mut caches = self.caches.write().await;
        let before = caches.len();
        caches.retain(|(existing, _)| existing != name);
        caches.len() != before
    }

    /// First match across every cache, oldest cache first
    pub async fn match_any(&self, key: &CacheKey) -> Option<CachedResponse> {
        let caches: Vec<Arc<Cache>> = self
            .caches
            .read()
            .await
            .iter()
            .map(|(_, cache)| Arc::clone(cache))
            .collect();

        for cache in caches {
            if let Some(response) = cache.get(key).await {
                return Some(response);
            }
        }
        None
    }

    async fn find(&self, name: &str) -> Option<Arc<Cache>> {
        self.caches
            .read()
            .await
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, cache)| Arc::clone(cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
            basic: true,
        }
    }

    fn key(path: &str) -> CacheKey {
        let url = url::Url::parse("http://crm.test").unwrap().join(path).unwrap();
        CacheKey::get(&url)
    }

    #[tokio::test]
    async fn open_reuses_existing_cache() {
        let storage = CacheStorage::new();
        let first = storage.open("static-v2").await;
        first.put(key("/"), response("shell")).await;

        let second = storage.open("static-v2").await;
        assert_eq!(second.len().await, 1);
        assert_eq!(storage.keys().await, vec!["static-v2".to_string()]);
    }

    #[tokio::test]
    async fn match_any_prefers_older_caches() {
        let storage = CacheStorage::new();
        storage.open("static-v2").await.put(key("/"), response("static")).await;
        storage.open("dynamic-v2").await.put(key("/"), response("dynamic")).await;

        let hit = storage.match_any(&key("/")).await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"static"));
        assert!(storage.match_any(&key("/missing")).await.is_none());
    }

    #[tokio::test]
    async fn delete_drops_cache_and_entries() {
        let storage = CacheStorage::new();
        storage.open("static-v1").await.put(key("/"), response("old")).await;

        assert!(storage.delete("static-v1").await);
        assert!(!storage.delete("static-v1").await);
        assert!(!storage.has("static-v1").await);
        assert!(storage.match_any(&key("/")).await.is_none());
    }

    #[tokio::test]
    async fn keys_differ_by_method() {
        let cache = Cache::default();
        let url = url::Url::parse("http://crm.test/api/v1/colleges").unwrap();
        cache.put(CacheKey::get(&url), response("list")).await;

        assert!(cache.get(&CacheKey::new(Method::POST, &url)).await.is_none());
        assert!(cache.get(&CacheKey::get(&url)).await.is_some());
    }

    #[tokio::test]
    async fn keys_differ_by_credentials() {
        let cache = Cache::default();
        let url = url::Url::parse("http://crm.test/api/v1/auth/me").unwrap();
        let alice = CacheKey::get(&url).for_credentials(Some("alice".into()));
        cache.put(alice.clone(), response("alice")).await;

        assert!(cache.get(&CacheKey::get(&url)).await.is_none());
        assert!(
            cache
                .get(&CacheKey::get(&url).for_credentials(Some("bob".into())))
                .await
                .is_none()
        );
        assert!(cache.get(&alice).await.is_some());
    }
}
