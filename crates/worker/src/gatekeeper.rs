//! The cache gatekeeper: lifecycle hooks and per-request strategies.

use std::sync::{Arc, Mutex, PoisonError};

use gatekeeper_core::{AppConfig, CacheStorage, Error, MatchOptions, Network, Request, Response, StoreNames};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use url::Url;

use crate::lifecycle::{ActivateOutcome, InstallOutcome, WorkerState};
use crate::routing::{Route, Router};

/// Where an answered response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The root document, served because nothing better was cached.
    OfflineShell,
}

/// A request the gatekeeper answered.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
    pub route: Route,
}

/// Result of the fetch hook.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The gatekeeper did not intercept; the host sends the request itself.
    Passthrough,
    Served(Served),
}

impl FetchOutcome {
    pub fn served(self) -> Option<Served> {
        match self {
            FetchOutcome::Served(served) => Some(served),
            FetchOutcome::Passthrough => None,
        }
    }
}

/// Offline-caching agent for one version of an application.
///
/// Storage and network are shared with background refresh tasks, hence the
/// `Arc`s. A new version is a new `Gatekeeper` over the same storage; once it
/// activates, the old one finds its stores gone and turns redundant.
pub struct Gatekeeper<S, N> {
    storage: Arc<S>,
    network: Arc<N>,
    router: Router,
    names: StoreNames,
    origin: Url,
    skeleton: Vec<Url>,
    skip_waiting: bool,
    state: RwLock<WorkerState>,
    background: Mutex<JoinSet<()>>,
}

impl<S: CacheStorage, N: Network> Gatekeeper<S, N> {
    /// Build a gatekeeper from validated configuration.
    pub fn new(config: &AppConfig, storage: Arc<S>, network: Arc<N>) -> Result<Self, Error> {
        let skeleton = config
            .skeleton_urls()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        Ok(Self {
            storage,
            network,
            router: Router::new(config),
            names: config.store_names(),
            origin: config.origin.clone(),
            skeleton,
            skip_waiting: config.skip_waiting,
            state: RwLock::new(WorkerState::Uninstalled),
            background: Mutex::new(JoinSet::new()),
        })
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn store_names(&self) -> &StoreNames {
        &self.names
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn transition(&self, hook: &'static str, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState { hook, state: state.to_string() });
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: WorkerState) {
        *self.state.write().await = to;
    }

    /// Install hook: precache the skeleton.
    ///
    /// All skeleton assets are fetched before any store is opened; one failed
    /// fetch or non-2xx status fails the install and leaves storage untouched.
    pub async fn install(&self) -> Result<InstallOutcome, Error> {
        self.transition("install", WorkerState::Uninstalled, WorkerState::Installing)
            .await?;

        match self.precache_skeleton().await {
            Ok(precached) => {
                self.set_state(WorkerState::Installed).await;
                tracing::info!(precache = self.names.precache(), precached, "worker installed");
                Ok(InstallOutcome {
                    precache: self.names.precache().to_string(),
                    precached,
                    skip_waiting: self.skip_waiting,
                })
            }
            Err(err) => {
                self.set_state(WorkerState::Uninstalled).await;
                tracing::error!(error = %err, "worker install failed");
                Err(err)
            }
        }
    }

    async fn precache_skeleton(&self) -> Result<usize, Error> {
        let mut fetches = JoinSet::new();
        for (index, url) in self.skeleton.iter().enumerate() {
            let network = Arc::clone(&self.network);
            let request = Request::get(url.clone());
            fetches.spawn(async move {
                let result = network.fetch(&request).await;
                (index, request, result)
            });
        }

        let mut fetched: Vec<Option<(Request, Response)>> = vec![None; self.skeleton.len()];
        while let Some(joined) = fetches.join_next().await {
            let (index, request, result) = joined.map_err(|e| Error::InstallFailed {
                url: "skeleton".to_string(),
                reason: format!("fetch task failed: {e}"),
            })?;

            let response = result.map_err(|e| Error::InstallFailed {
                url: request.url.to_string(),
                reason: e.to_string(),
            })?;
            if !response.ok() {
                return Err(Error::InstallFailed {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            fetched[index] = Some((request, response));
        }

        self.storage.open(self.names.precache()).await?;
        self.storage.open(self.names.runtime()).await?;

        let mut precached = 0;
        for (request, response) in fetched.into_iter().flatten() {
            self.storage.put(self.names.precache(), &request, response).await?;
            precached += 1;
        }
        Ok(precached)
    }

    /// Activate hook: drop other versions' stores and take control.
    pub async fn activate(&self) -> Result<ActivateOutcome, Error> {
        self.transition("activate", WorkerState::Installed, WorkerState::Activating)
            .await?;

        match self.delete_stale_stores().await {
            Ok(deleted) => {
                self.set_state(WorkerState::Active).await;
                tracing::info!(deleted = deleted.len(), runtime = self.names.runtime(), "worker active");
                Ok(ActivateOutcome { deleted })
            }
            Err(err) => {
                self.set_state(WorkerState::Installed).await;
                tracing::error!(error = %err, "worker activation failed");
                Err(err)
            }
        }
    }

    async fn delete_stale_stores(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if self.names.is_stale(&name) && self.storage.delete(&name).await? {
                tracing::debug!(store = %name, "deleted stale store");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Fetch hook: answer one intercepted request.
    ///
    /// Requests arriving before activation are not intercepted.
    pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if self.state().await != WorkerState::Active {
            tracing::debug!(url = %request.url, "worker not active; request not intercepted");
            return Ok(FetchOutcome::Passthrough);
        }
        if self.superseded().await? {
            self.set_state(WorkerState::Redundant).await;
            tracing::info!(runtime = self.names.runtime(), "stores deleted by a newer version; worker redundant");
            return Ok(FetchOutcome::Passthrough);
        }

        let route = self.router.route(request);
        tracing::debug!(method = %request.method, url = %request.url, ?route, "routing request");

        let served = match route {
            Route::Passthrough => return Ok(FetchOutcome::Passthrough),
            Route::NetworkFirst => self.network_first(request).await?,
            Route::StaleWhileRevalidate => self.stale_while_revalidate(request).await?,
            Route::CacheFirst => self.cache_first(request).await?,
        };
        Ok(FetchOutcome::Served(served))
    }

    /// Neither of this version's stores exists any more.
    async fn superseded(&self) -> Result<bool, Error> {
        let keys = self.storage.keys().await?;
        Ok(!keys.iter().any(|name| self.names.is_current(name)))
    }

    /// Wait for every background refresh started so far.
    pub async fn settle(&self) {
        loop {
            let mut pending = {
                let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::replace(&mut *background, JoinSet::new())
            };
            if pending.is_empty() {
                return;
            }
            while let Some(joined) = pending.join_next().await {
                if let Err(err) = joined {
                    tracing::warn!(error = %err, "background refresh task failed");
                }
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Result<Served, Error> {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    store(self.storage.as_ref(), self.names.runtime(), request, response.clone()).await;
                }
                Ok(Served { response, source: ResponseSource::Network, route: Route::NetworkFirst })
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network-first fetch failed; trying cache");

                if let Some(response) = self.lookup(request, MatchOptions::EXACT).await? {
                    return Ok(Served { response, source: ResponseSource::Cache, route: Route::NetworkFirst });
                }

                if let Some(response) = self.lookup(&self.shell_request(), MatchOptions::EXACT).await? {
                    return Ok(Served { response, source: ResponseSource::OfflineShell, route: Route::NetworkFirst });
                }

                Err(Error::Offline(request.url.to_string()))
            }
        }
    }

    async fn stale_while_revalidate(&self, request: &Request) -> Result<Served, Error> {
        if let Some(response) = self.lookup(request, MatchOptions::IGNORE_SEARCH).await? {
            self.revalidate(request.clone());
            return Ok(Served { response, source: ResponseSource::Cache, route: Route::StaleWhileRevalidate });
        }

        let response = self.network.fetch(request).await?;
        if response.ok() {
            store(self.storage.as_ref(), self.names.runtime(), request, response.clone()).await;
        }
        Ok(Served { response, source: ResponseSource::Network, route: Route::StaleWhileRevalidate })
    }

    async fn cache_first(&self, request: &Request) -> Result<Served, Error> {
        if let Some(response) = self.lookup(request, MatchOptions::EXACT).await? {
            return Ok(Served { response, source: ResponseSource::Cache, route: Route::CacheFirst });
        }

        let response = self.network.fetch(request).await?;
        Ok(Served { response, source: ResponseSource::Network, route: Route::CacheFirst })
    }

    /// Refresh `request` in the background and store a successful result.
    fn revalidate(&self, request: Request) {
        let storage = Arc::clone(&self.storage);
        let network = Arc::clone(&self.network);
        let runtime = self.names.runtime().to_string();

        let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        while background.try_join_next().is_some() {}

        background.spawn(async move {
            match network.fetch(&request).await {
                Ok(response) if response.ok() => store(storage.as_ref(), &runtime, &request, response).await,
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status, "refresh not stored");
                }
                Err(err) => {
                    tracing::debug!(url = %request.url, error = %err, "background refresh failed; keeping cached copy");
                }
            }
        });
    }

    /// Runtime store, then precache, then every other store.
    async fn lookup(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        for name in [self.names.runtime(), self.names.precache()] {
            if let Some(response) = self.storage.match_in(name, request, options).await? {
                return Ok(Some(response));
            }
        }
        self.storage.match_any(request, options).await
    }

    fn shell_request(&self) -> Request {
        let mut root = self.origin.clone();
        root.set_path("/");
        root.set_query(None);
        Request::get(root)
    }
}

/// Write to a store as a side effect of answering; failures only log.
///
/// A store that no longer exists is not recreated, so a refresh finishing
/// after a newer version activated cannot bring an old store back.
async fn store<S: CacheStorage>(storage: &S, name: &str, request: &Request, response: Response) {
    match storage.keys().await {
        Ok(keys) if keys.iter().any(|key| key == name) => {}
        Ok(_) => {
            tracing::debug!(store = name, url = %request.url, "store deleted; response not cached");
            return;
        }
        Err(err) => {
            tracing::warn!(store = name, url = %request.url, error = %err, "failed to update cache");
            return;
        }
    }

    if let Err(err) = storage.put(name, request, response).await {
        tracing::warn!(store = name, url = %request.url, error = %err, "failed to update cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStorage, ScriptedNetwork, body_text};
    use gatekeeper_core::{CacheDb, MemoryStorage, RequestMode, Strategy};

    type TestGatekeeper = Gatekeeper<MemoryStorage, ScriptedNetwork>;

    fn config() -> AppConfig {
        AppConfig { version: Some("v2".into()), ..Default::default() }
    }

    fn url(path: &str) -> Url {
        config().origin.join(path).unwrap()
    }

    fn build(config: &AppConfig) -> (TestGatekeeper, Arc<MemoryStorage>, Arc<ScriptedNetwork>) {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(ScriptedNetwork::serving_skeleton(config));
        let gatekeeper = Gatekeeper::new(config, Arc::clone(&storage), Arc::clone(&network)).unwrap();
        (gatekeeper, storage, network)
    }

    async fn active(config: &AppConfig) -> (TestGatekeeper, Arc<MemoryStorage>, Arc<ScriptedNetwork>) {
        let (gatekeeper, storage, network) = build(config);
        gatekeeper.install().await.unwrap();
        gatekeeper.activate().await.unwrap();
        (gatekeeper, storage, network)
    }

    async fn answer(gatekeeper: &TestGatekeeper, request: &Request) -> Served {
        gatekeeper.fetch(request).await.unwrap().served().expect("request intercepted")
    }

    #[tokio::test]
    async fn test_install_precaches_every_skeleton_url() {
        let config = config();
        let (gatekeeper, storage, _) = build(&config);

        let outcome = gatekeeper.install().await.unwrap();
        assert_eq!(outcome.precached, config.skeleton.len());
        assert!(outcome.skip_waiting);
        assert_eq!(gatekeeper.state().await, WorkerState::Installed);

        for skeleton_url in config.skeleton_urls().unwrap() {
            let hit = storage
                .match_in("mi-ruta-precache-v2", &Request::get(skeleton_url.clone()), MatchOptions::EXACT)
                .await
                .unwrap();
            assert!(hit.is_some(), "{skeleton_url} not precached");
        }
        assert!(storage.keys().await.unwrap().contains(&"mi-ruta-runtime-v2".to_string()));
    }

    #[tokio::test]
    async fn test_install_fails_when_any_asset_fails() {
        let config = config();
        let (gatekeeper, storage, network) = build(&config);
        network.serve_status(url("/static/icons/icon-512x512.png").as_str(), 404, "missing");

        let result = gatekeeper.install().await;
        assert!(matches!(result, Err(Error::InstallFailed { ref url, .. }) if url.ends_with("icon-512x512.png")));
        assert_eq!(gatekeeper.state().await, WorkerState::Uninstalled);
        assert!(storage.keys().await.unwrap().is_empty());

        network.serve(url("/static/icons/icon-512x512.png").as_str(), "icon");
        assert!(gatekeeper.install().await.is_ok());
        assert_eq!(storage.entries("mi-ruta-precache-v2").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_install_fails_offline() {
        let (gatekeeper, _, network) = build(&config());
        network.go_offline();
        assert!(matches!(gatekeeper.install().await, Err(Error::InstallFailed { .. })));
        assert!(matches!(gatekeeper.activate().await, Err(Error::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_install_twice_is_invalid() {
        let (gatekeeper, _, _) = build(&config());
        gatekeeper.install().await.unwrap();
        assert!(matches!(gatekeeper.install().await, Err(Error::InvalidState { hook: "install", .. })));
    }

    #[tokio::test]
    async fn test_activate_deletes_prior_versions() {
        let config = config();
        let (gatekeeper, storage, _) = build(&config);
        for name in ["mi-ruta-cache-v1", "mi-ruta-precache-v1", "mi-ruta-runtime-v1", "otra-app-cache-v1"] {
            storage.open(name).await.unwrap();
        }

        gatekeeper.install().await.unwrap();
        let outcome = gatekeeper.activate().await.unwrap();

        assert_eq!(outcome.deleted, vec!["mi-ruta-cache-v1", "mi-ruta-precache-v1", "mi-ruta-runtime-v1"]);
        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["otra-app-cache-v1", "mi-ruta-precache-v2", "mi-ruta-runtime-v2"]
        );
        assert_eq!(gatekeeper.state().await, WorkerState::Active);
    }

    #[tokio::test]
    async fn test_not_intercepted_before_activation() {
        let (gatekeeper, _, network) = build(&config());
        gatekeeper.install().await.unwrap();
        let calls = network.calls().len();

        let outcome = gatekeeper.fetch(&Request::navigate(url("/"))).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Passthrough));
        assert_eq!(network.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_non_get_never_intercepted() {
        let (gatekeeper, storage, network) = active(&config()).await;
        let calls = network.calls().len();

        for method in ["POST", "PUT", "DELETE"] {
            let request = Request::navigate(url("/buscar")).with_method(method);
            assert!(matches!(gatekeeper.fetch(&request).await.unwrap(), FetchOutcome::Passthrough));
        }
        assert_eq!(network.calls().len(), calls);
        assert!(storage.entries("mi-ruta-runtime-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_online_returns_network_and_stores_copy() {
        let (gatekeeper, storage, network) = active(&config()).await;
        network.serve(url("/buscar?origen=Gijon").as_str(), "resultados");

        let request = Request::navigate(url("/buscar?origen=Gijon"));
        let served = answer(&gatekeeper, &request).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.route, Route::NetworkFirst);
        assert_eq!(body_text(&served.response), "resultados");

        let copy = storage
            .match_in("mi-ruta-runtime-v2", &request, MatchOptions::EXACT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(copy, served.response);
    }

    #[tokio::test]
    async fn test_navigation_error_status_not_stored() {
        let (gatekeeper, storage, network) = active(&config()).await;
        network.serve_status(url("/buscar").as_str(), 500, "boom");

        let served = answer(&gatekeeper, &Request::navigate(url("/buscar"))).await;
        assert_eq!(served.response.status, 500);
        assert!(storage.entries("mi-ruta-runtime-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_runtime_copy() {
        let (gatekeeper, _, network) = active(&config()).await;
        network.serve(url("/buscar").as_str(), "resultados de ayer");
        let request = Request::navigate(url("/buscar"));
        answer(&gatekeeper, &request).await;

        network.go_offline();
        let served = answer(&gatekeeper, &request).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(body_text(&served.response), "resultados de ayer");
    }

    #[tokio::test]
    async fn test_navigation_offline_falls_back_to_root() {
        let (gatekeeper, _, network) = active(&config()).await;
        network.go_offline();

        let served = answer(&gatekeeper, &Request::navigate(url("/nunca-visitada"))).await;
        assert_eq!(served.source, ResponseSource::OfflineShell);
        assert_eq!(body_text(&served.response), "skeleton /");
    }

    #[tokio::test]
    async fn test_html_accept_offline_falls_back_to_root() {
        let (gatekeeper, _, network) = active(&config()).await;
        network.go_offline();

        let request = Request::get(url("/about")).with_accept("text/html");
        assert_eq!(answer(&gatekeeper, &request).await.source, ResponseSource::OfflineShell);
    }

    #[tokio::test]
    async fn test_navigation_offline_without_shell_fails() {
        let config = AppConfig { skeleton: vec!["/static/manifest.json".into()], ..config() };
        let (gatekeeper, _, network) = active(&config).await;
        network.go_offline();

        let result = gatekeeper.fetch(&Request::navigate(url("/buscar"))).await;
        assert!(matches!(result, Err(Error::Offline(_))));
    }

    #[tokio::test]
    async fn test_static_asset_served_stale_and_refreshed() {
        let (gatekeeper, storage, network) = active(&config()).await;
        let bare = Request::get(url("/static/app.css"));
        storage
            .put("mi-ruta-runtime-v2", &bare, Response::new(bare.url.as_str(), 200, "old css"))
            .await
            .unwrap();
        network.serve(url("/static/app.css?v=1").as_str(), "new css");

        let versioned = Request::get(url("/static/app.css?v=1"));
        let served = answer(&gatekeeper, &versioned).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.route, Route::StaleWhileRevalidate);
        assert_eq!(body_text(&served.response), "old css");

        gatekeeper.settle().await;
        assert_eq!(network.calls_to("http://localhost:5000/static/app.css?v=1"), 1);

        let refreshed = storage
            .match_in("mi-ruta-runtime-v2", &versioned, MatchOptions::EXACT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body_text(&refreshed), "new css");

        let next = answer(&gatekeeper, &versioned).await;
        assert_eq!(body_text(&next.response), "new css");
    }

    #[tokio::test]
    async fn test_static_refresh_failure_is_silent() {
        let (gatekeeper, storage, network) = active(&config()).await;
        network.go_offline();

        let manifest = Request::get(url("/static/manifest.json"));
        let served = answer(&gatekeeper, &manifest).await;
        assert_eq!(body_text(&served.response), "skeleton /static/manifest.json");

        gatekeeper.settle().await;
        assert_eq!(network.calls_to("http://localhost:5000/static/manifest.json"), 2);
        assert!(storage.entries("mi-ruta-runtime-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_miss_fetches_and_stores() {
        let (gatekeeper, storage, network) = active(&config()).await;
        network.serve(url("/static/app.js").as_str(), "console.log(1)");

        let request = Request::get(url("/static/app.js"));
        let served = answer(&gatekeeper, &request).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert!(
            storage
                .match_in("mi-ruta-runtime-v2", &request, MatchOptions::EXACT)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_static_miss_offline_fails() {
        let (gatekeeper, _, network) = active(&config()).await;
        network.go_offline();

        let result = gatekeeper.fetch(&Request::get(url("/static/app.js"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_font_host_is_stale_while_revalidate() {
        let (gatekeeper, storage, network) = active(&config()).await;
        let font = "https://fonts.gstatic.com/s/roboto/v30/roboto.woff2";
        network.serve(font, "woff2");

        let request = Request::get(Url::parse(font).unwrap()).with_mode(RequestMode::NoCors);
        assert_eq!(answer(&gatekeeper, &request).await.route, Route::StaleWhileRevalidate);
        assert_eq!(storage.entries("mi-ruta-runtime-v2").await.unwrap(), vec![font]);
    }

    #[tokio::test]
    async fn test_other_get_miss_fetches_once_without_storing() {
        let (gatekeeper, storage, network) = active(&config()).await;
        network.serve(url("/api/rutas.json").as_str(), "[]");
        let calls = network.calls().len();

        let request = Request::get(url("/api/rutas.json"));
        let served = answer(&gatekeeper, &request).await;
        gatekeeper.settle().await;

        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.route, Route::CacheFirst);
        assert_eq!(network.calls().len(), calls + 1);
        assert!(storage.entries("mi-ruta-runtime-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_get_hit_skips_network() {
        let (gatekeeper, storage, network) = active(&config()).await;
        let request = Request::get(url("/api/rutas.json"));
        storage
            .put("mi-ruta-runtime-v2", &request, Response::new(request.url.as_str(), 200, "cached"))
            .await
            .unwrap();
        let calls = network.calls().len();

        let served = answer(&gatekeeper, &request).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(network.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_other_get_miss_offline_fails() {
        let (gatekeeper, _, network) = active(&config()).await;
        network.go_offline();
        let result = gatekeeper.fetch(&Request::get(url("/api/rutas.json"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_cache_first_strategy_serves_precached_navigation() {
        let config = AppConfig { strategy: Strategy::CacheFirst, ..config() };
        let (gatekeeper, _, network) = active(&config).await;
        let calls = network.calls().len();

        let served = answer(&gatekeeper, &Request::navigate(url("/"))).await;
        assert_eq!(served.route, Route::CacheFirst);
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(network.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_version_upgrade_over_sqlite() {
        let storage = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let v1 = AppConfig { version: Some("v1".into()), ..Default::default() };
        let network = Arc::new(ScriptedNetwork::serving_skeleton(&v1));

        let old = Gatekeeper::new(&v1, Arc::clone(&storage), Arc::clone(&network)).unwrap();
        old.install().await.unwrap();
        old.activate().await.unwrap();

        let new = Gatekeeper::new(&config(), Arc::clone(&storage), Arc::clone(&network)).unwrap();
        new.install().await.unwrap();
        let outcome = new.activate().await.unwrap();
        assert_eq!(outcome.deleted, vec!["mi-ruta-precache-v1", "mi-ruta-runtime-v1"]);
        assert_eq!(storage.keys().await.unwrap(), vec!["mi-ruta-precache-v2", "mi-ruta-runtime-v2"]);

        network.go_offline();
        let served = new.fetch(&Request::navigate(url("/"))).await.unwrap().served().unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(body_text(&served.response), "skeleton /");
    }

    #[tokio::test]
    async fn test_superseded_worker_turns_redundant() {
        let storage = Arc::new(MemoryStorage::new());
        let v1 = AppConfig { version: Some("v1".into()), ..Default::default() };
        let network = Arc::new(ScriptedNetwork::serving_skeleton(&v1));
        network.serve(url("/buscar").as_str(), "resultados");

        let old = Gatekeeper::new(&v1, Arc::clone(&storage), Arc::clone(&network)).unwrap();
        old.install().await.unwrap();
        old.activate().await.unwrap();

        let new = Gatekeeper::new(&config(), Arc::clone(&storage), Arc::clone(&network)).unwrap();
        new.install().await.unwrap();
        new.activate().await.unwrap();

        let outcome = old.fetch(&Request::navigate(url("/buscar"))).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Passthrough));
        assert_eq!(old.state().await, WorkerState::Redundant);
        assert_eq!(storage.keys().await.unwrap(), vec!["mi-ruta-precache-v2", "mi-ruta-runtime-v2"]);

        let served = new.fetch(&Request::navigate(url("/buscar"))).await.unwrap().served().unwrap();
        assert_eq!(served.source, ResponseSource::Network);
    }

    #[tokio::test]
    async fn test_write_to_deleted_store_is_dropped() {
        let storage = MemoryStorage::new();
        storage.open("mi-ruta-runtime-v2").await.unwrap();
        let request = Request::get(url("/static/app.css"));

        store(&storage, "mi-ruta-runtime-v1", &request, Response::new(request.url.as_str(), 200, "css")).await;
        assert_eq!(storage.keys().await.unwrap(), vec!["mi-ruta-runtime-v2"]);

        store(&storage, "mi-ruta-runtime-v2", &request, Response::new(request.url.as_str(), 200, "css")).await;
        assert_eq!(storage.entries("mi-ruta-runtime-v2").await.unwrap(), vec![request.url.as_str()]);
    }

    #[tokio::test]
    async fn test_static_miss_error_status_not_stored() {
        let (gatekeeper, storage, network) = active(&config()).await;
        network.serve_status(url("/static/app.js").as_str(), 404, "missing");

        let served = answer(&gatekeeper, &Request::get(url("/static/app.js"))).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.status, 404);
        assert!(storage.entries("mi-ruta-runtime-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_refresh_error_status_keeps_cached_copy() {
        let (gatekeeper, storage, network) = active(&config()).await;
        let bare = Request::get(url("/static/app.css"));
        storage
            .put("mi-ruta-runtime-v2", &bare, Response::new(bare.url.as_str(), 200, "old css"))
            .await
            .unwrap();
        network.serve_status(url("/static/app.css?v=1").as_str(), 500, "boom");

        let versioned = Request::get(url("/static/app.css?v=1"));
        assert_eq!(body_text(&answer(&gatekeeper, &versioned).await.response), "old css");
        gatekeeper.settle().await;

        assert_eq!(network.calls_to("http://localhost:5000/static/app.css?v=1"), 1);
        assert_eq!(storage.entries("mi-ruta-runtime-v2").await.unwrap(), vec![bare.url.as_str()]);
        assert_eq!(body_text(&answer(&gatekeeper, &versioned).await.response), "old css");
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_answers() {
        let config = config();
        let storage = Arc::new(FailingStorage::new());
        let network = Arc::new(ScriptedNetwork::serving_skeleton(&config));
        let gatekeeper = Gatekeeper::new(&config, Arc::clone(&storage), Arc::clone(&network)).unwrap();
        gatekeeper.install().await.unwrap();
        gatekeeper.activate().await.unwrap();

        storage.fail_puts();
        network.serve(url("/buscar").as_str(), "resultados");

        let served = gatekeeper
            .fetch(&Request::navigate(url("/buscar")))
            .await
            .unwrap()
            .served()
            .unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(body_text(&served.response), "resultados");
        assert!(storage.entries("mi-ruta-runtime-v2").await.unwrap().is_empty());
    }
}
