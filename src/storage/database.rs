use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::repositories::kv_repository::KvRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::achievement::{sort_for_display, Achievement};
use crate::models::task::Task;
use crate::models::user::User;

use super::{
    decode_achievements, decode_tasks, decode_user, seed, DataStore, StorageProvider,
    KEY_ACHIEVEMENTS, KEY_TASKS, KEY_USER,
};

/// SQLite-backed key/value store.
#[derive(Clone, Debug)]
pub struct DatabaseStore {
    db: DbPool,
}

impl DatabaseStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn get(&self, key: &'static str) -> AppResult<Option<String>> {
        let db = self.db.clone();
        let row = run_blocking(move || db.with_connection(|conn| KvRepository::get(conn, key)))
            .await?;
        if let Some(row) = &row {
            debug!(target: "app::storage::db", key, revision = row.revision, "entry loaded");
        }
        Ok(row.map(|row| row.value))
    }

    async fn put<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) -> AppResult<()> {
        let payload = serde_json::to_string(value)?;
        let db = self.db.clone();
        run_blocking(move || db.with_connection(|conn| KvRepository::put(conn, key, &payload)))
            .await
    }

    /// Persists `seed` unless another writer got there first, then returns
    /// whatever is stored.
    async fn seed_if_absent(&self, key: &'static str, seed: String) -> AppResult<String> {
        let db = self.db.clone();
        run_blocking(move || {
            db.with_connection(|conn| {
                if KvRepository::put_if_absent(conn, key, &seed)? {
                    info!(target: "app::storage::db", key, "seeded default entry");
                }
                KvRepository::get(conn, key)?
                    .map(|row| row.value)
                    .ok_or_else(AppError::not_found)
            })
        })
        .await
    }
}

async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> AppResult<T> + Send + 'static,
) -> AppResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| AppError::other(format!("database task failed: {err}")))?
}

#[async_trait::async_trait]
impl DataStore for DatabaseStore {
    async fn load_user(&self) -> AppResult<User> {
        match self.get(KEY_USER).await? {
            Some(raw) => decode_user(&raw),
            None => Ok(seed::default_user()),
        }
    }

    async fn save_user(&self, user: &User) -> AppResult<()> {
        self.put(KEY_USER, user).await
    }

    async fn load_tasks(&self) -> AppResult<Vec<Task>> {
        if let Some(raw) = self.get(KEY_TASKS).await? {
            return decode_tasks(&raw);
        }
        let seed = serde_json::to_string(&seed::default_tasks(Utc::now()))?;
        let raw = self.seed_if_absent(KEY_TASKS, seed).await?;
        decode_tasks(&raw)
    }

    async fn save_tasks(&self, tasks: &[Task]) -> AppResult<()> {
        self.put(KEY_TASKS, tasks).await
    }

    async fn load_achievements(&self) -> AppResult<Vec<Achievement>> {
        if let Some(raw) = self.get(KEY_ACHIEVEMENTS).await? {
            return decode_achievements(&raw);
        }
        let seed = serde_json::to_string(&seed::default_achievements(Utc::now()))?;
        let raw = self.seed_if_absent(KEY_ACHIEVEMENTS, seed).await?;
        decode_achievements(&raw)
    }

    async fn save_achievements(&self, achievements: &[Achievement]) -> AppResult<()> {
        let mut ordered = achievements.to_vec();
        sort_for_display(&mut ordered);
        self.put(KEY_ACHIEVEMENTS, &ordered).await
    }

    fn provider(&self) -> StorageProvider {
        StorageProvider::Database
    }
}
