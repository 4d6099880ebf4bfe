//! Configuration layer: typed settings with file → env precedence.

use std::num::NonZeroU32;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

#[cfg(test)]
mod tests;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vellum";

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 15;
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_DB_IDLE_TIMEOUT_MS: u64 = 600_000;
const DEFAULT_DB_MAX_LIFETIME_MS: u64 = 1_800_000;
const DEFAULT_DB_ACQUIRE_TIMEOUT_MS: u64 = 30_000;

const DEFAULT_DOCUMENT_URI: &str = "mongodb://127.0.0.1:27017";
const DEFAULT_DOCUMENT_DATABASE: &str = "vellum";

const DEFAULT_CACHE_POST_LIMIT: usize = 500;
const DEFAULT_CACHE_USER_LIMIT: usize = 1000;
const DEFAULT_CACHE_POST_TTL_SECS: u64 = 600;
const DEFAULT_CACHE_USER_TTL_SECS: u64 = 1800;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub document_store: DocumentStoreSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Relational store connection parameters.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: NonZeroU32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

/// Document store connection parameters.
#[derive(Debug, Clone)]
pub struct DocumentStoreSettings {
    pub uri: String,
    pub database: String,
}

/// Entity cache sizing and expiry.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub post_limit: usize,
    pub user_limit: usize,
    pub post_ttl_secs: u64,
    pub user_ttl_secs: u64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (files, then
/// `VELLUM__`-prefixed environment variables).
pub fn load() -> Result<Settings, LoadError> {
    load_inner(None)
}

/// Load settings, layering an explicit file on top of the defaults.
pub fn load_from(path: &Path) -> Result<Settings, LoadError> {
    load_inner(Some(path))
}

fn load_inner(explicit: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VELLUM").separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    document_store: RawDocumentStoreSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    max_connections: Option<u32>,
    min_connections: Option<u32>,
    idle_timeout_ms: Option<u64>,
    max_lifetime_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDocumentStoreSettings {
    uri: Option<String>,
    database: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    post_limit: Option<usize>,
    user_limit: Option<usize>,
    post_ttl_secs: Option<u64>,
    user_ttl_secs: Option<u64>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            document_store,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            document_store: build_document_store_settings(document_store)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database
        .url
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LoadError::invalid("database.url", "must be set"))?;

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(max_value)
        .ok_or_else(|| LoadError::invalid("database.max_connections", "must be greater than zero"))?;

    let min_connections = database
        .min_connections
        .unwrap_or(DEFAULT_DB_MIN_CONNECTIONS);
    if min_connections > max_connections.get() {
        return Err(LoadError::invalid(
            "database.min_connections",
            "must not exceed max_connections",
        ));
    }

    let idle_timeout = positive_millis(
        database.idle_timeout_ms.unwrap_or(DEFAULT_DB_IDLE_TIMEOUT_MS),
        "database.idle_timeout_ms",
    )?;
    let max_lifetime = positive_millis(
        database.max_lifetime_ms.unwrap_or(DEFAULT_DB_MAX_LIFETIME_MS),
        "database.max_lifetime_ms",
    )?;
    let acquire_timeout = positive_millis(
        database
            .acquire_timeout_ms
            .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_MS),
        "database.acquire_timeout_ms",
    )?;

    Ok(DatabaseSettings {
        url,
        username: database.username,
        password: database.password,
        max_connections,
        min_connections,
        idle_timeout,
        max_lifetime,
        acquire_timeout,
    })
}

fn build_document_store_settings(
    document_store: RawDocumentStoreSettings,
) -> Result<DocumentStoreSettings, LoadError> {
    let uri = document_store
        .uri
        .unwrap_or_else(|| DEFAULT_DOCUMENT_URI.to_string());
    if uri.trim().is_empty() {
        return Err(LoadError::invalid("document_store.uri", "must not be empty"));
    }

    let database = document_store
        .database
        .unwrap_or_else(|| DEFAULT_DOCUMENT_DATABASE.to_string());
    if database.trim().is_empty() {
        return Err(LoadError::invalid(
            "document_store.database",
            "must not be empty",
        ));
    }

    Ok(DocumentStoreSettings { uri, database })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let post_ttl_secs = cache.post_ttl_secs.unwrap_or(DEFAULT_CACHE_POST_TTL_SECS);
    if post_ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.post_ttl_secs",
            "must be greater than zero",
        ));
    }
    let user_ttl_secs = cache.user_ttl_secs.unwrap_or(DEFAULT_CACHE_USER_TTL_SECS);
    if user_ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.user_ttl_secs",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        post_limit: cache.post_limit.unwrap_or(DEFAULT_CACHE_POST_LIMIT),
        user_limit: cache.user_limit.unwrap_or(DEFAULT_CACHE_USER_LIMIT),
        post_ttl_secs,
        user_ttl_secs,
    })
}

fn positive_millis(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(value))
}
