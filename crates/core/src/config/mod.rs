//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFGRID_*)
//! 2. TOML config file (if OFFGRID_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFGRID_*)
/// 2. TOML config file (if OFFGRID_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Serving origin and scope; relative shell paths resolve against it.
    ///
    /// Set via OFFGRID_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix of every store name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deployment version token embedded in the current store name.
    ///
    /// Set via OFFGRID_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Ordered app shell manifest of relative paths.
    #[serde(default = "default_app_shell")]
    pub app_shell: Vec<String>,

    /// Shell document every navigation is cached under.
    #[serde(default = "default_shell_root")]
    pub shell_root: String,

    /// Substring of the CDN hostname served stale-while-revalidate.
    #[serde(default = "default_cdn_host")]
    pub cdn_host: String,

    /// Substring of the CDN path served stale-while-revalidate.
    #[serde(default = "default_cdn_path")]
    pub cdn_path: String,

    /// Regex matched against same-origin paths for icon assets.
    #[serde(default = "default_icon_pattern")]
    pub icon_pattern: String,

    /// Body of the document served to navigations when fully offline.
    #[serde(default = "default_offline_html")]
    pub offline_html: String,

    /// Path to SQLite cache database.
    ///
    /// Set via OFFGRID_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Transport timeout in milliseconds; 0 leaves requests unbounded.
    #[serde(default)]
    pub timeout_ms: u64,
}

fn default_origin() -> String {
    "http://localhost:8000/".into()
}

fn default_cache_prefix() -> String {
    "offgrid-cache-".into()
}

fn default_version() -> String {
    "v1".into()
}

fn default_app_shell() -> Vec<String> {
    [
        "./",
        "./index.html",
        "./styles.css",
        "./app.js",
        "./manifest.webmanifest",
        "./icons/icon-192.png",
        "./icons/icon-512.png",
        "./icons/icon-maskable-512.png",
        "./wheels/manifest.json",
        "./wheels/asciiquarium_redux-latest.whl",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_shell_root() -> String {
    "./index.html".into()
}

fn default_cdn_host() -> String {
    "cdn.jsdelivr.net".into()
}

fn default_cdn_path() -> String {
    "/pyodide/".into()
}

fn default_icon_pattern() -> String {
    r"^/icons/icon-(192|512|maskable-512)\.png$".into()
}

fn default_offline_html() -> String {
    "<h1>Offline</h1>".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offgrid-cache.sqlite")
}

fn default_user_agent() -> String {
    "offgrid/0.1".into()
}

fn default_max_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            app_shell: default_app_shell(),
            shell_root: default_shell_root(),
            cdn_host: default_cdn_host(),
            cdn_path: default_cdn_path(),
            icon_pattern: default_icon_pattern(),
            offline_html: default_offline_html(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: 0,
        }
    }
}

impl AppConfig {
    /// Name of the store that is authoritative for this deployment.
    pub fn store_name(&self) -> String {
        format!("{}{}", self.cache_prefix, self.version)
    }

    /// Transport timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Parsed serving origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::figment()
            .extract::<Self>()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFGRID_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("OFFGRID_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}
