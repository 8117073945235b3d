use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::storage::StorageProvider;

pub const ENV_CONFIG_FILE: &str = "DISCIPLINE_CONFIG";

const DEFAULT_KV_BASE_URL: &str = "http://127.0.0.1:8787";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_DATA_DIR: &str = ".discipline-baby";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub data_dir: PathBuf,
    pub kv_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Local,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            kv_base_url: DEFAULT_KV_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl StorageConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Reported by `/health`.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    /// IANA zone used for calendar-day comparisons.
    pub timezone: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            timezone: "UTC".to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// File named by `DISCIPLINE_CONFIG` (if any), then process env overrides.
    pub fn load() -> AppResult<Self> {
        let path = std::env::var(ENV_CONFIG_FILE)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        Self::load_with(path.as_deref())
    }

    /// Like [`AppConfig::load`] with an explicit file in place of
    /// `DISCIPLINE_CONFIG`.
    pub fn load_with(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::config(format!("cannot read config {}: {err}", path.display()))
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(target: "app::config", path = %path.display(), "configuration file loaded");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> AppResult<Self> {
        serde_yaml::from_str(raw).map_err(|err| AppError::config(format!("invalid config: {err}")))
    }

    /// Applies `DISCIPLINE_*` overrides read through `lookup`. Unparseable
    /// values are ignored with a warning.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(raw) = read("DISCIPLINE_STORAGE_PROVIDER") {
            match raw.parse::<StorageProvider>() {
                Ok(provider) => self.storage.provider = provider,
                Err(err) => warn!(target: "app::config", "invalid DISCIPLINE_STORAGE_PROVIDER, ignoring: {err}"),
            }
        }

        if let Some(raw) = read("DISCIPLINE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(raw);
        }

        if let Some(raw) = read("DISCIPLINE_KV_BASE_URL") {
            if raw.starts_with("http://") || raw.starts_with("https://") {
                self.storage.kv_base_url = raw;
            } else {
                warn!(target: "app::config", url = %raw, "invalid DISCIPLINE_KV_BASE_URL, ignoring");
            }
        }

        if let Some(raw) = read("DISCIPLINE_BIND_ADDR") {
            self.server.bind_addr = raw;
        }

        if let Some(raw) = read("DISCIPLINE_TIMEZONE") {
            match raw.parse::<Tz>() {
                Ok(_) => self.timezone = raw,
                Err(err) => warn!(target: "app::config", "invalid DISCIPLINE_TIMEZONE, ignoring: {err}"),
            }
        }

        if let Some(raw) = read("DISCIPLINE_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(raw));
        }

        if let Some(raw) = read("APP_ENV") {
            self.server.environment = raw;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.timezone()?;
        if self.storage.kv_base_url.trim().is_empty() {
            return Err(AppError::config("kv_base_url must not be empty"));
        }
        Ok(())
    }

    pub fn timezone(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| AppError::config(format!("unknown time zone `{}`: {err}", self.timezone)))
    }
}
