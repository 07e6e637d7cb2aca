//! Interception layer configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Destination;

mod validation;

pub use validation::ConfigError;

/// Name of the cache generation the shipped build writes to.
pub const CACHE_NAME: &str = "app-shell-v4";

/// Filename of the single document entry.
pub const DOCUMENT_ENTRY: &str = "index.html";

/// Application shell and library assets seeded into the cache on install.
pub const PRECACHE_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./manifest.json",
    "./icons/icon-192.png",
    "./icons/icon-512.png",
    "./icons/icon-512-maskable.png",
    "https://cdn.jsdelivr.net/npm/@supabase/supabase-js@2",
    "https://cdnjs.cloudflare.com/ajax/libs/Chart.js/4.4.0/chart.umd.min.js",
];

/// Host suffixes of the remote data backend.
pub const REMOTE_HOST_SUFFIXES: &[&str] = &["supabase.co"];

/// Path segments that mark a data API call on any host.
pub const API_PATH_SEGMENTS: &[&str] = &["/rest/v1/", "/auth/v1/", "/storage/v1/"];

/// Destinations served cache-first.
pub const STATIC_DESTINATIONS: &[Destination] = &[
    Destination::Script,
    Destination::Style,
    Destination::Image,
    Destination::Font,
    Destination::Manifest,
];

/// Interception layer configuration.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Name (version tag) of the current cache generation.
    ///
    /// Set via SHELLCACHE_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Base URL the application is served from; relative precache entries
    /// and the document entry resolve against it. Must end with `/`.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Assets fetched and stored on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Filename of the document entry (`index.html`).
    #[serde(default = "default_document_entry")]
    pub document_entry: String,

    /// Hostname suffixes routed network-only.
    #[serde(default = "default_remote_host_suffixes")]
    pub remote_host_suffixes: Vec<String>,

    /// Path segments routed network-only regardless of host.
    #[serde(default = "default_api_path_segments")]
    pub api_path_segments: Vec<String>,

    /// Request destinations served cache-first.
    #[serde(default = "default_static_destinations")]
    pub static_destinations: Vec<Destination>,

    /// Path to the SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_name() -> String {
    CACHE_NAME.into()
}

fn default_scope() -> String {
    "http://localhost/".into()
}

fn default_precache() -> Vec<String> {
    PRECACHE_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_document_entry() -> String {
    DOCUMENT_ENTRY.into()
}

fn default_remote_host_suffixes() -> Vec<String> {
    REMOTE_HOST_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_api_path_segments() -> Vec<String> {
    API_PATH_SEGMENTS.iter().map(|s| s.to_string()).collect()
}

fn default_static_destinations() -> Vec<Destination> {
    STATIC_DESTINATIONS.to_vec()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            scope: default_scope(),
            precache: default_precache(),
            document_entry: default_document_entry(),
            remote_host_suffixes: default_remote_host_suffixes(),
            api_path_segments: default_api_path_segments(),
            static_destinations: default_static_destinations(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ShellConfig {
    /// Default configuration served from `scope`.
    pub fn for_scope(scope: impl Into<String>) -> Self {
        Self { scope: scope.into(), ..Default::default() }
    }

    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The scope as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope does not parse.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// URL every document response is stored under, whatever URL produced it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope or entry do not form a URL.
    pub fn document_url(&self) -> Result<Url, ConfigError> {
        self.scope_url()?
            .join(&self.document_entry)
            .map_err(|e| ConfigError::Invalid { field: "document_entry".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
