//! Gatekeeper configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GATEKEEPER_*)
//! 2. TOML config file (if GATEKEEPER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::storage::{StoreNames, version_tag};

mod validation;

pub use validation::ConfigError;

/// Which routing table the gatekeeper applies to `GET` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Network-first for documents, stale-while-revalidate for static
    /// assets and fonts, cache-first for everything else.
    #[default]
    Layered,
    /// Cache-first for every request, as the first worker did.
    CacheFirst,
}

/// Gatekeeper configuration.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GATEKEEPER_*)
/// 2. TOML config file (if GATEKEEPER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefix shared by every store this application owns.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Version tag embedded in store names.
    ///
    /// Derived from the skeleton list when unset.
    #[serde(default)]
    pub version: Option<String>,

    /// Origin of the controlled page. Skeleton paths resolve against it.
    #[serde(default = "default_origin")]
    pub origin: Url,

    /// Assets precached on install.
    #[serde(default = "default_skeleton")]
    pub skeleton: Vec<String>,

    /// Same-origin path prefix served stale-while-revalidate.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Web-font hosts served stale-while-revalidate.
    #[serde(default = "default_font_hosts")]
    pub font_hosts: Vec<String>,

    /// Activate right after install instead of waiting for the host.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    #[serde(default)]
    pub strategy: Strategy,

    /// Path to SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_namespace() -> String {
    "mi-ruta".into()
}

fn default_origin() -> Url {
    Url::parse("http://localhost:5000/").expect("default origin is a valid URL")
}

fn default_skeleton() -> Vec<String> {
    vec![
        "/".into(),
        "/static/manifest.json".into(),
        "/static/icons/icon-192x192.png".into(),
        "/static/icons/icon-512x512.png".into(),
    ]
}

fn default_static_prefix() -> String {
    "/static/".into()
}

fn default_font_hosts() -> Vec<String> {
    vec!["fonts.googleapis.com".into(), "fonts.gstatic.com".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./gatekeeper-cache.sqlite")
}

fn default_user_agent() -> String {
    "gatekeeper/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            version: None,
            origin: default_origin(),
            skeleton: default_skeleton(),
            static_prefix: default_static_prefix(),
            font_hosts: default_font_hosts(),
            skip_waiting: true,
            strategy: Strategy::default(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured version tag, or one derived from the skeleton.
    pub fn version_tag(&self) -> String {
        self.version.clone().unwrap_or_else(|| version_tag(&self.skeleton))
    }

    /// Names of the current precache and runtime stores.
    pub fn store_names(&self) -> StoreNames {
        StoreNames::new(&self.namespace, &self.version_tag())
    }

    /// Skeleton entries resolved against the origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if an entry cannot be joined onto the origin.
    pub fn skeleton_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.skeleton
            .iter()
            .map(|entry| {
                self.origin.join(entry).map_err(|e| ConfigError::Invalid {
                    field: "skeleton".into(),
                    reason: format!("{entry}: {e}"),
                })
            })
            .collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `GATEKEEPER_`
    /// 2. TOML file from `GATEKEEPER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GATEKEEPER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("GATEKEEPER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
