use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::user::{User, UserProfileUpdate};
use crate::services::WriteLock;
use crate::storage::DataStore;

const MAX_NAME_CHARS: usize = 40;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DataStore>,
    write_lock: WriteLock,
}

impl UserService {
    pub fn new(store: Arc<dyn DataStore>, write_lock: WriteLock) -> Self {
        Self { store, write_lock }
    }

    pub async fn get_user(&self) -> AppResult<User> {
        self.store.load_user().await
    }

    /// Merges profile fields onto the stored user. Progression fields are not
    /// reachable from [`UserProfileUpdate`].
    pub async fn update_profile(&self, update: UserProfileUpdate) -> AppResult<User> {
        let _guard = self.write_lock.lock().await;
        let mut user = self.store.load_user().await?;
        apply_profile_update(&mut user, update)?;
        self.store.save_user(&user).await?;
        info!(target: "app::user", name = %user.name, "profile updated");
        Ok(user)
    }

    /// Raw storage-level merge used by the edge API: top-level keys of
    /// `patch` replace the stored ones, then the result must validate.
    pub async fn merge_raw(&self, patch: JsonValue) -> AppResult<User> {
        let JsonValue::Object(patch) = patch else {
            return Err(AppError::validation("user patch must be a JSON object"));
        };

        let _guard = self.write_lock.lock().await;
        let current = self.store.load_user().await?;
        let mut merged = serde_json::to_value(&current)?;
        if let JsonValue::Object(fields) = &mut merged {
            fields.extend(patch);
        }

        let user: User = serde_json::from_value(merged)
            .map_err(|err| AppError::validation(format!("invalid user payload: {err}")))?;
        user.validate().map_err(|err| match err {
            AppError::MalformedInput { message, .. } => AppError::validation(message),
            other => other,
        })?;

        self.store.save_user(&user).await?;
        info!(target: "app::user", level = user.level, xp = user.xp, "user replaced");
        Ok(user)
    }
}

fn apply_profile_update(user: &mut User, update: UserProfileUpdate) -> AppResult<()> {
    if let Some(name) = update.name {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::validation(format!(
                "name must be 1 to {MAX_NAME_CHARS} characters"
            )));
        }
        user.name = trimmed.to_string();
    }

    let text_fields = [
        (update.avatar, &mut user.avatar),
        (update.pet_name, &mut user.pet_name),
        (update.app_logo, &mut user.app_logo),
        (update.app_name, &mut user.app_name),
        (update.landing_title, &mut user.landing_title),
        (update.landing_description, &mut user.landing_description),
        (update.landing_cta, &mut user.landing_cta),
        (update.dashboard_link, &mut user.dashboard_link),
    ];
    for (value, slot) in text_fields {
        if let Some(value) = value {
            *slot = value;
        }
    }

    if let Some(pomodoro) = update.pomodoro_settings {
        if let Some(modes) = pomodoro.modes {
            if modes.iter().any(|mode| mode.duration == 0) {
                return Err(AppError::validation("pomodoro durations must be positive"));
            }
            user.pomodoro_settings.modes = modes;
        }
        if let Some(interval) = pomodoro.long_break_interval {
            if interval == 0 {
                return Err(AppError::validation("long break interval must be positive"));
            }
            user.pomodoro_settings.long_break_interval = interval;
        }
    }

    Ok(())
}
