//! Per-request strategy selection.

use gatekeeper_core::{AppConfig, Request, Strategy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Strategy chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Not intercepted; the request goes to the network untouched.
    Passthrough,
    NetworkFirst,
    StaleWhileRevalidate,
    CacheFirst,
}

/// Routing table, evaluated top to bottom, first match wins.
#[derive(Debug, Clone)]
pub struct Router {
    strategy: Strategy,
    origin: Url,
    static_prefix: String,
    font_hosts: Vec<String>,
}

impl Router {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            strategy: config.strategy,
            origin: config.origin.clone(),
            static_prefix: config.static_prefix.clone(),
            font_hosts: config.font_hosts.clone(),
        }
    }

    pub fn route(&self, request: &Request) -> Route {
        if !request.is_get() {
            return Route::Passthrough;
        }

        if self.strategy == Strategy::CacheFirst {
            return Route::CacheFirst;
        }

        if request.is_navigation() || request.accepts_html() {
            Route::NetworkFirst
        } else if self.is_static_asset(&request.url) || self.is_font(&request.url) {
            Route::StaleWhileRevalidate
        } else {
            Route::CacheFirst
        }
    }

    fn is_static_asset(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin() && url.path().starts_with(&self.static_prefix)
    }

    fn is_font(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.font_hosts.iter().any(|font| font.eq_ignore_ascii_case(host)))
    }
}
