use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::achievement::{sort_for_display, Achievement};
use crate::models::task::Task;
use crate::models::user::User;

use super::{
    decode_achievements, decode_tasks, decode_user, seed, DataStore, StorageProvider,
};

const USER_FILE: &str = "habit-heroes-user.json";
const TASKS_FILE: &str = "habit-heroes-tasks.json";
const ACHIEVEMENTS_FILE: &str = "habit-heroes-achievements.json";

/// Device-local JSON documents, one file per key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> AppResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!(target: "app::storage::local", data_dir = %dir.display(), "local store ready");
        Ok(Self { dir })
    }

    async fn read(&self, file: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.dir.join(file)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> AppResult<()> {
        let payload = serde_json::to_vec(value)?;
        let target = self.dir.join(file);
        let staging = self.dir.join(format!("{file}.tmp"));
        fs::write(&staging, payload).await?;
        fs::rename(&staging, &target).await?;
        debug!(target: "app::storage::local", file, "document written");
        Ok(())
    }
}

#[async_trait::async_trait]
impl DataStore for LocalStore {
    async fn load_user(&self) -> AppResult<User> {
        match self.read(USER_FILE).await? {
            Some(raw) => decode_user(&raw),
            None => Ok(seed::default_user()),
        }
    }

    async fn save_user(&self, user: &User) -> AppResult<()> {
        self.write(USER_FILE, user).await
    }

    async fn load_tasks(&self) -> AppResult<Vec<Task>> {
        if let Some(raw) = self.read(TASKS_FILE).await? {
            return decode_tasks(&raw);
        }
        let tasks = seed::default_tasks(Utc::now());
        self.write(TASKS_FILE, &tasks).await?;
        info!(target: "app::storage::local", count = tasks.len(), "seeded default tasks");
        Ok(tasks)
    }

    async fn save_tasks(&self, tasks: &[Task]) -> AppResult<()> {
        self.write(TASKS_FILE, tasks).await
    }

    async fn load_achievements(&self) -> AppResult<Vec<Achievement>> {
        if let Some(raw) = self.read(ACHIEVEMENTS_FILE).await? {
            return decode_achievements(&raw);
        }
        let achievements = seed::default_achievements(Utc::now());
        self.write(ACHIEVEMENTS_FILE, &achievements).await?;
        Ok(achievements)
    }

    async fn save_achievements(&self, achievements: &[Achievement]) -> AppResult<()> {
        let mut ordered = achievements.to_vec();
        sort_for_display(&mut ordered);
        self.write(ACHIEVEMENTS_FILE, &ordered).await
    }

    fn provider(&self) -> StorageProvider {
        StorageProvider::Local
    }
}
