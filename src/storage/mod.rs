//! Persistence collaborators. Each backend is a thin key/value adapter; none
//! of them performs progression arithmetic.

pub mod database;
pub mod local;
pub mod remote_kv;
pub mod seed;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::achievement::Achievement;
use crate::models::task::{validate_task_set, Task};
use crate::models::user::User;

pub use database::DatabaseStore;
pub use local::LocalStore;
pub use remote_kv::RemoteKvStore;

pub const KEY_USER: &str = "user";
pub const KEY_TASKS: &str = "tasks";
pub const KEY_ACHIEVEMENTS: &str = "achievements";

/// Storage contract consumed by the services.
///
/// Loads return seeded defaults when nothing is stored and fail with
/// [`AppError::MalformedInput`] when a stored value does not parse or
/// validate. Saves replace the stored value wholesale. Calls are atomic
/// individually, never across calls.
#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    async fn load_user(&self) -> AppResult<User>;

    async fn save_user(&self, user: &User) -> AppResult<()>;

    async fn load_tasks(&self) -> AppResult<Vec<Task>>;

    async fn save_tasks(&self, tasks: &[Task]) -> AppResult<()>;

    async fn load_achievements(&self) -> AppResult<Vec<Achievement>>;

    async fn save_achievements(&self, achievements: &[Achievement]) -> AppResult<()>;

    fn provider(&self) -> StorageProvider;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageProvider {
    #[default]
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "kv")]
    RemoteKv,
    #[serde(rename = "db")]
    Database,
}

impl StorageProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageProvider::Local => "local",
            StorageProvider::RemoteKv => "kv",
            StorageProvider::Database => "db",
        }
    }
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageProvider {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "local" => Ok(StorageProvider::Local),
            "kv" | "remote" | "remote-kv" => Ok(StorageProvider::RemoteKv),
            "db" | "database" | "sqlite" => Ok(StorageProvider::Database),
            other => Err(AppError::config(format!(
                "unknown storage provider `{other}` (expected local, kv or db)"
            ))),
        }
    }
}

/// Resolves the configured provider into a concrete store, once.
pub fn build_store(config: &AppConfig) -> AppResult<Arc<dyn DataStore>> {
    let store: Arc<dyn DataStore> = match config.storage.provider {
        StorageProvider::Local => Arc::new(LocalStore::new(config.storage.data_dir.clone())?),
        StorageProvider::RemoteKv => Arc::new(RemoteKvStore::new(
            &config.storage.kv_base_url,
            config.storage.request_timeout(),
        )?),
        StorageProvider::Database => {
            let pool = DbPool::new(config.storage.data_dir.join(DATABASE_FILE))?;
            Arc::new(DatabaseStore::new(pool))
        }
    };
    info!(target: "app::storage", provider = %store.provider(), "storage provider ready");
    Ok(store)
}

pub const DATABASE_FILE: &str = "discipline-baby.sqlite";

pub(crate) fn decode_user(raw: &str) -> AppResult<User> {
    let user: User = decode(KEY_USER, raw)?;
    user.validate()?;
    Ok(user)
}

pub(crate) fn decode_tasks(raw: &str) -> AppResult<Vec<Task>> {
    let tasks: Vec<Task> = decode(KEY_TASKS, raw)?;
    validate_task_set(&tasks)?;
    Ok(tasks)
}

pub(crate) fn decode_achievements(raw: &str) -> AppResult<Vec<Achievement>> {
    decode(KEY_ACHIEVEMENTS, raw)
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> AppResult<T> {
    serde_json::from_str(raw).map_err(|err| AppError::malformed(key, err.to_string()))
}
