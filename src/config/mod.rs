//! Configuration loading for the outreach CRM.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `CRM_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const ENV_PREFIX: &str = "CRM_";
const REDACTED: &str = "[REDACTED]";

/// Application configuration derived from `CRM_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Lifetime of a sign-in session (default: 168 hours, i.e. 7 days)
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
    /// PBKDF2 rounds for newly hashed passwords
    #[serde(default = "default_password_hash_iterations")]
    pub password_hash_iterations: u32,
    /// Demo account seeded at startup when both email and password are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_password: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default)]
    pub offline_cache: OfflineCacheConfig,
}

/// Offline cache gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OfflineCacheConfig {
    /// Cache holding the application shell (`CRM_STATIC_CACHE_NAME`)
    #[serde(default = "default_static_cache_name")]
    pub static_cache_name: String,

    /// Cache holding runtime responses (`CRM_DYNAMIC_CACHE_NAME`)
    #[serde(default = "default_dynamic_cache_name")]
    pub dynamic_cache_name: String,

    /// Shell paths fetched on install (`CRM_SHELL_URLS`, comma-separated)
    #[serde(default = "default_shell_urls")]
    pub shell_urls: Vec<String>,

    /// Path prefix classifying requests as API calls (`CRM_API_PREFIX`)
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Host substrings classifying requests as backend calls (`CRM_BACKEND_HOST_MARKERS`)
    #[serde(default = "default_backend_host_markers")]
    pub backend_host_markers: Vec<String>,

    /// Origin the gateway fronts (`CRM_UPSTREAM_URL`)
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Listen address of the gateway (`CRM_GATEWAY_BIND_ADDR`)
    #[serde(default = "default_gateway_bind_addr")]
    pub gateway_bind_addr: String,

    /// Timeout for upstream requests (`CRM_UPSTREAM_TIMEOUT_MS`)
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
}

impl Default for OfflineCacheConfig {
    fn default() -> Self {
        Self {
            static_cache_name: default_static_cache_name(),
            dynamic_cache_name: default_dynamic_cache_name(),
            shell_urls: default_shell_urls(),
            api_prefix: default_api_prefix(),
            backend_host_markers: default_backend_host_markers(),
            upstream_url: default_upstream_url(),
            gateway_bind_addr: default_gateway_bind_addr(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

impl OfflineCacheConfig {
    /// Validate cache names, shell paths and the upstream origin
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.static_cache_name.trim().is_empty() || self.dynamic_cache_name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheName);
        }

        if self.static_cache_name == self.dynamic_cache_name {
            return Err(ConfigError::DuplicateCacheName {
                name: self.static_cache_name.clone(),
            });
        }

        if let Some(path) = self.shell_urls.iter().find(|path| !path.starts_with('/')) {
            return Err(ConfigError::InvalidShellUrl { value: path.clone() });
        }

        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidApiPrefix {
                value: self.api_prefix.clone(),
            });
        }

        let upstream = Url::parse(&self.upstream_url).map_err(|source| {
            ConfigError::InvalidUpstreamUrl {
                value: self.upstream_url.clone(),
                reason: source.to_string(),
            }
        })?;
        if !matches!(upstream.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUpstreamUrl {
                value: self.upstream_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::InvalidUpstreamTimeout {
                value: self.upstream_timeout_ms,
            });
        }

        Ok(())
    }

    /// Returns the gateway listen address as a socket address.
    pub fn gateway_bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.gateway_bind_addr.parse()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            session_ttl_hours: default_session_ttl_hours(),
            password_min_length: default_password_min_length(),
            password_hash_iterations: default_password_hash_iterations(),
            demo_email: None,
            demo_password: None,
            cors_allowed_origins: Vec::new(),
            offline_cache: OfflineCacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Session lifetime as a chrono duration.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours as i64)
    }

    /// Demo credentials, when both halves are configured.
    pub fn demo_credentials(&self) -> Option<(&str, &str)> {
        match (self.demo_email.as_deref(), self.demo_password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();

        if config.demo_password.is_some() {
            config.demo_password = Some(REDACTED.to_string());
        }

        config.database_url = redact_url_password(&config.database_url);

        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error if settings are out of bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: self.api_bind_addr.clone(),
                source,
            })?;

        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidDbMaxConnections {
                value: self.db_max_connections,
            });
        }

        // Between one hour and ninety days
        if self.session_ttl_hours == 0 || self.session_ttl_hours > 24 * 90 {
            return Err(ConfigError::InvalidSessionTtl {
                value: self.session_ttl_hours,
            });
        }

        if self.password_min_length < 6 || self.password_min_length > 128 {
            return Err(ConfigError::InvalidPasswordMinLength {
                value: self.password_min_length,
            });
        }

        if self.password_hash_iterations < 1_000 {
            return Err(ConfigError::InvalidPasswordHashIterations {
                value: self.password_hash_iterations,
            });
        }

        if self.demo_email.is_some() != self.demo_password.is_some() {
            return Err(ConfigError::IncompleteDemoCredentials);
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        self.offline_cache.validate()?;

        Ok(())
    }
}

fn redact_url_password(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some(REDACTED)).is_ok() {
                url.to_string()
            } else {
                REDACTED.to_string()
            }
        }
        _ => raw.to_string(),
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://outreach-crm.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_session_ttl_hours() -> u64 {
    168 // 7 days
}

fn default_password_min_length() -> usize {
    6
}

fn default_password_hash_iterations() -> u32 {
    100_000
}

fn default_static_cache_name() -> String {
    "static-v2".to_string()
}

fn default_dynamic_cache_name() -> String {
    "dynamic-v2".to_string()
}

fn default_shell_urls() -> Vec<String> {
    ["/", "/manifest.json", "/favicon.ico", "/placeholder.svg"]
        .iter()
        .map(|path| path.to_string())
        .collect()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_backend_host_markers() -> Vec<String> {
    vec!["supabase".to_string()]
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_gateway_bind_addr() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    10_000
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidNumber { key: String, value: String },
    #[error("database url is missing; set CRM_DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("database max connections must be positive, got {value}")]
    InvalidDbMaxConnections { value: u32 },
    #[error("session ttl must be between 1 and 2160 hours, got {value}")]
    InvalidSessionTtl { value: u64 },
    #[error("password minimum length must be between 6 and 128, got {value}")]
    InvalidPasswordMinLength { value: usize },
    #[error("password hash iterations must be at least 1000, got {value}")]
    InvalidPasswordHashIterations { value: u32 },
    #[error("demo credentials need both CRM_DEMO_EMAIL and CRM_DEMO_PASSWORD")]
    IncompleteDemoCredentials,
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("cache names must not be empty")]
    EmptyCacheName,
    #[error("static and dynamic cache names must differ, both are '{name}'")]
    DuplicateCacheName { name: String },
    #[error("shell url '{value}' must be an absolute path")]
    InvalidShellUrl { value: String },
    #[error("api prefix '{value}' must start with '/'")]
    InvalidApiPrefix { value: String },
    #[error("invalid upstream url '{value}': {reason}")]
    InvalidUpstreamUrl { value: String, reason: String },
    #[error("upstream timeout must be positive, got {value}")]
    InvalidUpstreamTimeout { value: u64 },
}

/// Loads configuration using layered `.env` files and `CRM_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates configuration.
    ///
    /// Precedence, lowest first: `.env`, `.env.local`, `.env.<profile>`,
    /// `.env.<profile>.local`, process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = take_string(&mut layered, "PROFILE").unwrap_or(profile_hint);
        let api_bind_addr =
            take_string(&mut layered, "API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take_string(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format =
            take_string(&mut layered, "LOG_FORMAT").unwrap_or_else(default_log_format);
        let database_url =
            take_string(&mut layered, "DATABASE_URL").unwrap_or_else(default_database_url);
        let db_max_connections = take_parsed(&mut layered, "DB_MAX_CONNECTIONS")?
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = take_parsed(&mut layered, "DB_ACQUIRE_TIMEOUT_MS")?
            .unwrap_or_else(default_db_acquire_timeout_ms);
        let session_ttl_hours = take_parsed(&mut layered, "SESSION_TTL_HOURS")?
            .unwrap_or_else(default_session_ttl_hours);
        let password_min_length = take_parsed(&mut layered, "PASSWORD_MIN_LENGTH")?
            .unwrap_or_else(default_password_min_length);
        let password_hash_iterations = take_parsed(&mut layered, "PASSWORD_HASH_ITERATIONS")?
            .unwrap_or_else(default_password_hash_iterations);
        let demo_email = take_string(&mut layered, "DEMO_EMAIL");
        let demo_password = take_string(&mut layered, "DEMO_PASSWORD");
        let cors_allowed_origins =
            take_list(&mut layered, "CORS_ALLOWED_ORIGINS").unwrap_or_default();

        let offline_cache = OfflineCacheConfig {
            static_cache_name: take_string(&mut layered, "STATIC_CACHE_NAME")
                .unwrap_or_else(default_static_cache_name),
            dynamic_cache_name: take_string(&mut layered, "DYNAMIC_CACHE_NAME")
                .unwrap_or_else(default_dynamic_cache_name),
            shell_urls: take_list(&mut layered, "SHELL_URLS").unwrap_or_else(default_shell_urls),
            api_prefix: take_string(&mut layered, "API_PREFIX").unwrap_or_else(default_api_prefix),
            backend_host_markers: take_list(&mut layered, "BACKEND_HOST_MARKERS")
                .unwrap_or_else(default_backend_host_markers),
            upstream_url: take_string(&mut layered, "UPSTREAM_URL")
                .unwrap_or_else(default_upstream_url),
            gateway_bind_addr: take_string(&mut layered, "GATEWAY_BIND_ADDR")
                .unwrap_or_else(default_gateway_bind_addr),
            upstream_timeout_ms: take_parsed(&mut layered, "UPSTREAM_TIMEOUT_MS")?
                .unwrap_or_else(default_upstream_timeout_ms),
        };

        if !layered.is_empty() {
            tracing::debug!(
                keys = ?layered.keys().collect::<Vec<_>>(),
                "Ignoring unrecognised CRM_* settings"
            );
        }

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            session_ttl_hours,
            password_min_length,
            password_hash_iterations,
            demo_email,
            demo_password,
            cors_allowed_origins,
            offline_cache,
        };

        config.validate()?;

        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("CRM_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn take_string(values: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    values
        .remove(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn take_parsed<T: std::str::FromStr>(
    values: &mut BTreeMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match take_string(values, key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                key: format!("{ENV_PREFIX}{key}"),
                value: raw,
            }),
        None => Ok(None),
    }
}

fn take_list(values: &mut BTreeMap<String, String>, key: &str) -> Option<Vec<String>> {
    take_string(values, key).map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
