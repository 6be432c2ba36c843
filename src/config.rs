use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::MatchSettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

fn default_backend() -> StorageBackend { StorageBackend::Postgres }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_geocode_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_geocode_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            country: default_country(),
            timeout_secs: default_geocoder_timeout(),
            min_interval_ms: default_min_interval_ms(),
            cache_size: default_geocode_cache_size(),
            cache_ttl_secs: default_geocode_cache_ttl(),
        }
    }
}

fn default_geocoder_url() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { "CarpoolConnectApp/1.0 (https://carpoolconnect.netlify.app)".to_string() }
fn default_country() -> String { "USA".to_string() }
fn default_geocoder_timeout() -> u64 { 10 }
fn default_min_interval_ms() -> u64 { 1000 }
fn default_geocode_cache_size() -> u64 { 10_000 }
fn default_geocode_cache_ttl() -> u64 { 86_400 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    #[serde(default = "default_raw_candidate_cap")]
    pub raw_candidate_cap: usize,
    #[serde(default = "default_all_radius_meters")]
    pub all_radius_meters: f64,
    #[serde(default = "default_nearby_radius_miles")]
    pub default_nearby_radius_miles: f64,
    #[serde(default = "default_max_nearby_radius_miles")]
    pub max_nearby_radius_miles: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            raw_candidate_cap: default_raw_candidate_cap(),
            all_radius_meters: default_all_radius_meters(),
            default_nearby_radius_miles: default_nearby_radius_miles(),
            max_nearby_radius_miles: default_max_nearby_radius_miles(),
        }
    }
}

impl From<&MatchingSettings> for MatchSettings {
    fn from(settings: &MatchingSettings) -> Self {
        Self {
            result_limit: settings.result_limit,
            raw_candidate_cap: settings.raw_candidate_cap,
            all_radius_meters: settings.all_radius_meters,
            default_nearby_radius_miles: settings.default_nearby_radius_miles,
            max_nearby_radius_miles: settings.max_nearby_radius_miles,
        }
    }
}

fn default_result_limit() -> usize { 6 }
fn default_raw_candidate_cap() -> usize { 20 }
fn default_all_radius_meters() -> f64 { 16_093.44 }
fn default_nearby_radius_miles() -> f64 { 5.0 }
fn default_max_nearby_radius_miles() -> f64 { 50.0 }

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
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CARPOOL__)
    /// 5. `DATABASE_URL` and `JWT_SECRET`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CARPOOL__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CARPOOL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_well_known_env(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CARPOOL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_well_known_env(settings)?.try_deserialize()
    }
}

/// Apply the unprefixed variables hosting platforms usually set
fn apply_well_known_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }

    builder.build()
}
