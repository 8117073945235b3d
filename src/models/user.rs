use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PET_STYLE: &str = "pet1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroMode {
    pub id: String,
    pub name: String,
    /// Minutes.
    pub duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PomodoroSettings {
    pub modes: Vec<PomodoroMode>,
    pub long_break_interval: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        let mode = |id: &str, name: &str, duration: u32| PomodoroMode {
            id: id.to_string(),
            name: name.to_string(),
            duration,
        };
        Self {
            modes: vec![
                mode("work", "Work", 25),
                mode("shortBreak", "Short Break", 5),
                mode("longBreak", "Long Break", 15),
            ],
            long_break_interval: 4,
        }
    }
}

/// Single device-scoped profile. Progression fields (`xp`, `level`,
/// `xp_to_next_level`, `pet_style`) change only through the progression
/// engine; everything else is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub name: String,
    pub avatar: String,
    pub level: i64,
    pub xp: i64,
    pub xp_to_next_level: i64,
    pub pet_style: String,
    pub pet_name: String,
    pub app_logo: String,
    pub pomodoro_settings: PomodoroSettings,
    pub app_name: String,
    pub landing_title: String,
    pub landing_description: String,
    pub landing_cta: String,
    pub dashboard_link: String,
}

impl Default for User {
    fn default() -> Self {
        Self {
            name: "Alex".to_string(),
            avatar: "avatar1".to_string(),
            level: 1,
            xp: 0,
            xp_to_next_level: 100,
            pet_style: DEFAULT_PET_STYLE.to_string(),
            pet_name: "泡泡".to_string(),
            app_logo: String::new(),
            pomodoro_settings: PomodoroSettings::default(),
            app_name: "Discipline Baby".to_string(),
            landing_title: "Gamify Your Child's Habits".to_string(),
            landing_description: "Turn daily routines and learning into a fun adventure. \
                Motivate your kids with rewards, achievements, and a virtual pet that grows with them."
                .to_string(),
            landing_cta: "Get Started for Free".to_string(),
            dashboard_link: "设置页面".to_string(),
        }
    }
}

impl User {
    /// Shape checks applied to every loaded user before any arithmetic.
    pub fn validate(&self) -> AppResult<()> {
        if self.level < 1 {
            return Err(AppError::malformed(
                "user",
                format!("level must be at least 1, got {}", self.level),
            ));
        }
        if self.xp_to_next_level <= 0 {
            return Err(AppError::malformed(
                "user",
                format!(
                    "xpToNextLevel must be positive, got {}",
                    self.xp_to_next_level
                ),
            ));
        }
        if self.xp < 0 || self.xp >= self.xp_to_next_level {
            return Err(AppError::malformed(
                "user",
                format!(
                    "xp {} outside [0, {})",
                    self.xp, self.xp_to_next_level
                ),
            ));
        }
        Ok(())
    }
}

/// Partial profile edit. Progression fields are not part of it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub app_logo: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub landing_title: Option<String>,
    #[serde(default)]
    pub landing_description: Option<String>,
    #[serde(default)]
    pub landing_cta: Option<String>,
    #[serde(default)]
    pub dashboard_link: Option<String>,
    #[serde(default)]
    pub pomodoro_settings: Option<PomodoroSettingsUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettingsUpdate {
    #[serde(default)]
    pub modes: Option<Vec<PomodoroMode>>,
    #[serde(default)]
    pub long_break_interval: Option<u32>,
}
