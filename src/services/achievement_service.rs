use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::achievement::{sort_for_display, Achievement};
use crate::services::WriteLock;
use crate::storage::DataStore;

/// Editorial badge list. Unlocking is manual; completions never touch it.
#[derive(Clone)]
pub struct AchievementService {
    store: Arc<dyn DataStore>,
    write_lock: WriteLock,
}

impl AchievementService {
    pub fn new(store: Arc<dyn DataStore>, write_lock: WriteLock) -> Self {
        Self { store, write_lock }
    }

    pub async fn list(&self) -> AppResult<Vec<Achievement>> {
        self.store.load_achievements().await
    }

    /// Replaces the list; it is stored and returned in display order.
    pub async fn replace(&self, mut achievements: Vec<Achievement>) -> AppResult<Vec<Achievement>> {
        let mut seen = HashSet::with_capacity(achievements.len());
        for achievement in &achievements {
            if achievement.id.trim().is_empty() {
                return Err(AppError::validation("achievement id must not be empty"));
            }
            if !seen.insert(achievement.id.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate achievement id `{}`",
                    achievement.id
                )));
            }
        }

        sort_for_display(&mut achievements);
        let _guard = self.write_lock.lock().await;
        self.store.save_achievements(&achievements).await?;
        info!(target: "app::achievements", count = achievements.len(), "achievements replaced");
        Ok(achievements)
    }
}
