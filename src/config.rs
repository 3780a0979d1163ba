use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::core::{ProximityFilter, SearchOptions};
use crate::models::PageLimits;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub country: String,
    /// Per-lookup timeout, retries included
    pub timeout_ms: u64,
    pub max_retries: u32,
    /// First retry delay; doubles per attempt
    pub backoff_ms: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.zippopotam.us".to_string(),
            country: "us".to_string(),
            timeout_ms: 3000,
            max_retries: 2,
            backoff_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// L2 cache; omitted means in-process only
    pub redis_url: Option<String>,
    pub ttl_secs: u64,
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            ttl_secs: 86_400,
            l1_cache_size: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_per_page: u32,
    pub max_per_page: u32,
    pub geocode_concurrency: usize,
    pub request_timeout_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
            geocode_concurrency: 8,
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// URL path under which uploaded images are served
    pub public_path: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            public_path: "/static/uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Single allowed origin; unset means permissive
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SKILLSWAP__)
    /// 5. DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SKILLSWAP__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SKILLSWAP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_per_page: self.search.default_per_page.max(1),
            max_per_page: self.search.max_per_page.max(1),
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            page_limits: self.page_limits(),
            request_timeout: Duration::from_millis(self.search.request_timeout_ms),
            image_base_path: self.uploads.public_path.clone(),
        }
    }

    /// Timeout for a single HTTP attempt, sized so that every retry and
    /// its backoff fit inside the per-lookup `geocoder.timeout_ms` budget
    pub fn geocoder_attempt_timeout(&self) -> Duration {
        let geo = &self.geocoder;
        let attempts = geo.max_retries.saturating_add(1);
        let backoff_total = (0..geo.max_retries).fold(0u64, |total, attempt| {
            total.saturating_add(geo.backoff_ms.saturating_mul(2u64.saturating_pow(attempt)))
        });

        let per_attempt = match geo.timeout_ms.saturating_sub(backoff_total) / u64::from(attempts) {
            0 => geo.timeout_ms / u64::from(attempts),
            ms => ms,
        };

        Duration::from_millis(per_attempt.max(1))
    }

    pub fn proximity_filter(&self) -> ProximityFilter {
        ProximityFilter::new(
            self.search.geocode_concurrency,
            Duration::from_millis(self.geocoder.timeout_ms),
        )
    }
}

/// `DATABASE_URL` takes precedence over any configured `database.url`
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}
