// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Deployment environment, which selects the logging profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Production,
    Staging,
    Development,
}

impl AppEnv {
    /// Parse an `APP_ENV` value. Unknown values fall back to production.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => AppEnv::Development,
            "staging" => AppEnv::Staging,
            "production" | "prod" => AppEnv::Production,
            other => {
                eprintln!("Unknown APP_ENV '{}', using production defaults", other);
                AppEnv::Production
            }
        }
    }

    /// Default tracing directive for this environment.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            AppEnv::Production => "info",
            AppEnv::Staging => "warn",
            AppEnv::Development => "debug",
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment
    pub env: AppEnv,
    /// Server port
    pub port: u16,

    // --- Document store ---
    /// Elasticsearch base URL
    pub elasticsearch_url: String,
    /// Index holding user documents
    pub elasticsearch_index: String,

    // --- Tile cache ---
    /// Redis URL; the in-process cache is used when unset
    pub redis_url: Option<String>,
    /// Requested tile TTL (the cache enforces a 7 day floor)
    pub cache_ttl: Duration,

    // --- Tile provider ---
    /// Base URL of the slippy-map tile server
    pub osm_base_url: String,
    /// User-Agent sent to the tile server (required by its usage policy)
    pub osm_user_agent: String,
    /// Per-request timeout for tile downloads
    pub osm_timeout: Duration,
    /// Zoom used by the map endpoint when the request omits it
    pub map_zoom: u8,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            env: AppEnv::Development,
            port: 8080,
            elasticsearch_url: "http://localhost:9200".to_string(),
            elasticsearch_index: "users".to_string(),
            redis_url: None,
            cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            osm_base_url: "https://tile.openstreetmap.org".to_string(),
            osm_user_agent: "user-service/1.0".to_string(),
            osm_timeout: Duration::from_secs(10),
            map_zoom: 13,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            env: env::var("APP_ENV")
                .map(|v| AppEnv::parse(&v))
                .unwrap_or(defaults.env),
            port: parse_var("PORT", defaults.port)?,
            elasticsearch_url: env::var("ELASTICSEARCH_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.elasticsearch_url),
            elasticsearch_index: env::var("ELASTICSEARCH_INDEX")
                .unwrap_or(defaults.elasticsearch_index),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            cache_ttl: Duration::from_secs(parse_var(
                "CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )?),
            osm_base_url: env::var("OSM_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.osm_base_url),
            osm_user_agent: env::var("OSM_USER_AGENT").unwrap_or(defaults.osm_user_agent),
            osm_timeout: Duration::from_secs(parse_var(
                "OSM_TIMEOUT_SECS",
                defaults.osm_timeout.as_secs(),
            )?),
            map_zoom: parse_var("MAP_ZOOM", defaults.map_zoom)?,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
