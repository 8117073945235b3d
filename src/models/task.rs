use std::fmt;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Task difficulty. Values outside the known three are kept verbatim so a
/// stored task round-trips, and they earn no XP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Unrecognized(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Easy" => Difficulty::Easy,
            "Medium" => Difficulty::Medium,
            "Hard" => Difficulty::Hard,
            _ => Difficulty::Unrecognized(value),
        }
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Paused,
    /// Accepted from older worker payloads; never due.
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Paused => "paused",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayTag {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl From<Weekday> for WeekdayTag {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => WeekdayTag::Mon,
            Weekday::Tue => WeekdayTag::Tue,
            Weekday::Wed => WeekdayTag::Wed,
            Weekday::Thu => WeekdayTag::Thu,
            Weekday::Fri => WeekdayTag::Fri,
            Weekday::Sat => WeekdayTag::Sat,
            Weekday::Sun => WeekdayTag::Sun,
        }
    }
}

impl std::str::FromStr for WeekdayTag {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "mon" => Ok(WeekdayTag::Mon),
            "tue" => Ok(WeekdayTag::Tue),
            "wed" => Ok(WeekdayTag::Wed),
            "thu" => Ok(WeekdayTag::Thu),
            "fri" => Ok(WeekdayTag::Fri),
            "sat" => Ok(WeekdayTag::Sat),
            "sun" => Ok(WeekdayTag::Sun),
            other => Err(AppError::validation(format!("unknown weekday tag `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub interval: u32,
    pub unit: RecurrenceUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<WeekdayTag>>,
}

impl Recurrence {
    pub fn weekly(interval: u32) -> Self {
        Self {
            interval,
            unit: RecurrenceUnit::Week,
            days_of_week: None,
        }
    }

    pub fn on_days(days: Vec<WeekdayTag>) -> Self {
        Self {
            interval: 1,
            unit: RecurrenceUnit::Week,
            days_of_week: Some(days),
        }
    }

    /// Explicit weekday list, when present and non-empty.
    pub fn explicit_days(&self) -> Option<&[WeekdayTag]> {
        self.days_of_week
            .as_deref()
            .filter(|days| !days.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub completed: bool,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("task id must not be empty".to_string());
        }
        if let Some(recurrence) = &self.recurrence {
            if recurrence.interval < 1 {
                return Err(format!(
                    "task `{}` has recurrence interval {}",
                    self.id, recurrence.interval
                ));
            }
        }
        Ok(())
    }

    pub fn is_custom(&self) -> bool {
        self.id.starts_with(CUSTOM_ID_PREFIX)
    }
}

pub const CUSTOM_ID_PREFIX: &str = "custom-";

/// Checks a whole task set: every task valid, ids unique.
pub fn validate_task_set(tasks: &[Task]) -> AppResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(tasks.len());
    for task in tasks {
        task.validate()
            .map_err(|message| AppError::malformed("tasks", message))?;
        if !seen.insert(task.id.as_str()) {
            return Err(AppError::malformed(
                "tasks",
                format!("duplicate task id `{}`", task.id),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateInput {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<Option<Recurrence>>,
    #[serde(default)]
    pub time: Option<Option<String>>,
}
