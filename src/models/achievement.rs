use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::CUSTOM_ID_PREFIX;

/// Badge with an editorial unlock state. Nothing unlocks these automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_unlocked: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_required: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_required: Option<u32>,
}

impl Achievement {
    pub fn is_custom(&self) -> bool {
        self.id.starts_with(CUSTOM_ID_PREFIX)
    }
}

/// Custom badges first, then unlocked ones. Stable within each group.
pub fn sort_for_display(achievements: &mut [Achievement]) {
    achievements.sort_by_key(|achievement| (!achievement.is_custom(), !achievement.unlocked));
}
