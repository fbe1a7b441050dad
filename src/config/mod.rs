//! Configuration loading for the OAuth configuration service.
//!
//! Values come from `.env`, `.env.local`, `.env.{profile}` and
//! `.env.{profile}.local`, then the process environment. Only keys prefixed
//! with `OAUTHCFG_` are read; later sources override earlier ones.

use std::{collections::BTreeMap, env, fmt, net::SocketAddr, path::PathBuf, str::FromStr};

use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;
use thiserror::Error;

const ENV_PREFIX: &str = "OAUTHCFG_";
const REDACTED: &str = "[REDACTED]";
const CRYPTO_KEY_LEN: usize = 32;

const DEFAULT_PROFILE: &str = "local";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "json";
const DEFAULT_DATABASE_URL: &str = "postgresql://localhost:5432/oauth_config";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_ACQUIRE_TIMEOUT_MS: u64 = 5000;

/// Application configuration derived from `OAUTHCFG_*` environment variables.
#[derive(Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    pub profile: String,
    pub api_bind_addr: String,
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub log_level: String,
    /// `json` or `pretty`
    pub log_format: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_ms: u64,
    /// Bearer tokens accepted on the admin endpoints
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operator_tokens: Vec<String>,
    /// Raw AES-256 key for client secret encryption
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_key: Option<Vec<u8>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            api_bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_acquire_timeout_ms: DEFAULT_DB_ACQUIRE_TIMEOUT_MS,
            operator_tokens: Vec::new(),
            crypto_key: None,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("profile", &self.profile)
            .field("api_bind_addr", &self.api_bind_addr)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("database_url", &self.database_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_ms", &self.db_acquire_timeout_ms)
            .field("operator_tokens", &REDACTED)
            .field("crypto_key", &self.crypto_key.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl AppConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Pretty JSON of the configuration with tokens and key replaced by a marker.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(fields) = value.as_object_mut() {
            for key in ["OPERATOR_TOKENS", "CRYPTO_KEY"] {
                if let Some(field) = fields.get_mut(key) {
                    *field = serde_json::Value::String(REDACTED.to_string());
                }
            }
        }
        serde_json::to_string_pretty(&value)
    }

    /// Checks that every required setting is present and well formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.crypto_key.as_ref().ok_or(ConfigError::MissingCryptoKey)?;
        if key.len() != CRYPTO_KEY_LEN {
            return Err(ConfigError::InvalidCryptoKeyLength { length: key.len() });
        }
        if self.operator_tokens.is_empty() {
            return Err(ConfigError::MissingOperatorTokens);
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidDbMaxConnections {
                value: self.db_max_connections,
            });
        }
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }
        self.bind_addr()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: self.api_bind_addr.clone(),
                source,
            })?;
        Ok(())
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("OAUTHCFG_{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("no operator tokens configured; set OAUTHCFG_OPERATOR_TOKEN or OAUTHCFG_OPERATOR_TOKENS")]
    MissingOperatorTokens,
    #[error("crypto key is missing; set OAUTHCFG_CRYPTO_KEY")]
    MissingCryptoKey,
    #[error("crypto key is not valid base64: {error}")]
    InvalidCryptoKeyBase64 { error: String },
    #[error("crypto key must decode to exactly 32 bytes, got {length} bytes")]
    InvalidCryptoKeyLength { length: usize },
    #[error("database url is empty; set OAUTHCFG_DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("database max connections must be at least 1, got {value}")]
    InvalidDbMaxConnections { value: u32 },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
}

/// Prefix-stripped key/value pairs gathered from every source.
struct LayeredEnv(BTreeMap<String, String>);

impl LayeredEnv {
    /// Removes `key`, treating an empty value as unset.
    fn take(&mut self, key: &str) -> Option<String> {
        self.0.remove(key).filter(|value| !value.trim().is_empty())
    }

    fn take_or(&mut self, key: &str, default: &str) -> String {
        self.take(key).unwrap_or_else(|| default.to_string())
    }

    fn take_parsed<T: FromStr>(&mut self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.take(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        }
    }

    /// `OPERATOR_TOKENS` (comma-separated) takes precedence over `OPERATOR_TOKEN`.
    fn take_operator_tokens(&mut self) -> Vec<String> {
        let single = self.take("OPERATOR_TOKEN");
        match self.take("OPERATOR_TOKENS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
            None => single.map(|token| vec![token.trim().to_string()]).unwrap_or_default(),
        }
    }

    fn take_crypto_key(&mut self) -> Result<Option<Vec<u8>>, ConfigError> {
        self.take("CRYPTO_KEY")
            .map(|encoded| {
                general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| ConfigError::InvalidCryptoKeyBase64 {
                        error: e.to_string(),
                    })
            })
            .transpose()
    }
}

/// Loads configuration using layered `.env` files and `OAUTHCFG_*` env vars.
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

    /// Creates a loader that looks for `.env` files in `base_dir`.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut values, profile_hint) = self.collect_layered_env()?;
        values.extend(
            env::vars()
                .filter_map(|(key, value)| key.strip_prefix(ENV_PREFIX).map(|k| (k.to_string(), value))),
        );
        let mut layered = LayeredEnv(values);

        let config = AppConfig {
            profile: layered.take_or("PROFILE", &profile_hint),
            api_bind_addr: layered.take_or("API_BIND_ADDR", DEFAULT_BIND_ADDR),
            log_level: layered.take_or("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            log_format: layered.take_or("LOG_FORMAT", DEFAULT_LOG_FORMAT),
            database_url: layered.take_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            db_max_connections: layered
                .take_parsed("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_acquire_timeout_ms: layered
                .take_parsed("DB_ACQUIRE_TIMEOUT_MS", DEFAULT_DB_ACQUIRE_TIMEOUT_MS)?,
            operator_tokens: layered.take_operator_tokens(),
            crypto_key: layered.take_crypto_key()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads the dotenv layers. The profile is resolved after the first two
    /// files so `.env.local` can select it.
    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        self.merge_dotenv(self.base_dir.join(format!(".env.{profile}")), &mut values)?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{profile}.local")),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        let iter = match dotenvy::from_path_iter(&path) {
            Ok(iter) => iter,
            Err(dotenvy::Error::Io(ref io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(());
            }
            Err(source) => return Err(ConfigError::EnvFile { path, source }),
        };

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
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
