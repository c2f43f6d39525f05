//! In-memory cache storage.

use tokio::sync::RwLock;

use super::{CacheStorage, MatchOptions, require_get};
use crate::{Error, Request, RequestKey, Response};

struct StoredEntry {
    key: RequestKey,
    response: Response,
}

struct NamedCache {
    name: String,
    entries: Vec<StoredEntry>,
}

impl NamedCache {
    fn lookup(&self, key: &RequestKey, options: MatchOptions) -> Option<&Response> {
        if options.ignore_search {
            self.entries
                .iter()
                .rev()
                .find(|entry| entry.key.without_query == key.without_query)
                .map(|entry| &entry.response)
        } else {
            self.entries
                .iter()
                .find(|entry| entry.key.url == key.url)
                .map(|entry| &entry.response)
        }
    }
}

/// Process-local storage.
///
/// Uses a tokio RwLock around the store list; writes to the same key are
/// serialized by the lock and the last writer wins.
#[derive(Default)]
pub struct MemoryStorage {
    caches: RwLock<Vec<NamedCache>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut caches = self.caches.write().await;
        if !caches.iter().any(|cache| cache.name == name) {
            caches.push(NamedCache { name: name.to_string(), entries: Vec::new() });
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let caches = self.caches.read().await;
        Ok(caches.iter().map(|cache| cache.name.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut caches = self.caches.write().await;
        let before = caches.len();
        caches.retain(|cache| cache.name != name);
        Ok(caches.len() != before)
    }

    async fn match_in(&self, name: &str, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = request.key();
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find(|cache| cache.name == name)
            .and_then(|cache| cache.lookup(&key, options))
            .cloned())
    }

    async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), Error> {
        require_get(request)?;
        let key = request.key();
        let mut caches = self.caches.write().await;

        let index = match caches.iter().position(|cache| cache.name == name) {
            Some(index) => index,
            None => {
                caches.push(NamedCache { name: name.to_string(), entries: Vec::new() });
                caches.len() - 1
            }
        };

        let cache = &mut caches[index];
        cache.entries.retain(|entry| entry.key.url != key.url);
        cache.entries.push(StoredEntry { key, response });
        Ok(())
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, Error> {
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find(|cache| cache.name == name)
            .map(|cache| cache.entries.iter().map(|entry| entry.key.url.clone()).collect())
            .unwrap_or_default())
    }
}
