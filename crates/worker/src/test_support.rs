//! Scripted network and fixtures shared by the worker's tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use gatekeeper_core::{AppConfig, CacheStorage, Error, MatchOptions, MemoryStorage, Network, Request, Response};

/// Network double answering from a table of URLs.
///
/// Unknown URLs answer 404. Every call is recorded, including calls made
/// while offline.
#[derive(Default)]
pub struct ScriptedNetwork {
    responses: Mutex<HashMap<String, (u16, String)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A network serving every skeleton asset of `config`.
    pub fn serving_skeleton(config: &AppConfig) -> Self {
        let network = Self::new();
        for url in config.skeleton_urls().unwrap() {
            network.serve(url.as_str(), &format!("skeleton {}", url.path()));
        }
        network
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.serve_status(url, 200, body);
    }

    pub fn serve_status(&self, url: &str, status: u16, body: &str) {
        self.responses.lock().unwrap().insert(url.to_string(), (status, body.to_string()));
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == url).count()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{url}: connection refused")));
        }

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or((404, "not found".to_string()));
        Ok(Response::new(url, status, body))
    }
}

/// In-memory storage whose writes can be switched to fail.
#[derive(Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_puts: AtomicBool,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl CacheStorage for FailingStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete(name).await
    }

    async fn match_in(&self, name: &str, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        self.inner.match_in(name, request, options).await
    }

    async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), Error> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::MigrationFailed("disk full".to_string()));
        }
        self.inner.put(name, request, response).await
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, Error> {
        self.inner.entries(name).await
    }
}

pub fn body_text(response: &Response) -> String {
    String::from_utf8_lossy(&response.body).to_string()
}
