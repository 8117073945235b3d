use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::task::{
    validate_task_set, Difficulty, Recurrence, RecurrenceUnit, Task, TaskCreateInput, TaskStatus,
    TaskUpdateInput, CUSTOM_ID_PREFIX,
};
use crate::services::schedule::ScheduleResolver;
use crate::services::WriteLock;
use crate::storage::DataStore;

const KNOWN_CATEGORIES: &[&str] = &["Learning", "Creative", "Health", "School", "Activity"];
const DEFAULT_CATEGORY: &str = "Learning";
const MAX_TITLE_CHARS: usize = 160;

/// Task list management. None of these operations touch XP; completion
/// toggles belong to [`crate::services::completion_service::CompletionService`].
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn DataStore>,
    schedule: ScheduleResolver,
    write_lock: WriteLock,
}

impl TaskService {
    pub fn new(store: Arc<dyn DataStore>, schedule: ScheduleResolver, write_lock: WriteLock) -> Self {
        Self {
            store,
            schedule,
            write_lock,
        }
    }

    pub fn schedule(&self) -> &ScheduleResolver {
        &self.schedule
    }

    pub async fn list_tasks(&self) -> AppResult<Vec<Task>> {
        let tasks = self.store.load_tasks().await?;
        debug!(target: "app::tasks", count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    pub async fn get_task(&self, id: &str) -> AppResult<Task> {
        self.store
            .load_tasks()
            .await?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(AppError::not_found)
    }

    /// Tasks due on `date` in the configured time zone, in stored order.
    pub async fn tasks_due_on(&self, date: NaiveDate) -> AppResult<Vec<Task>> {
        let tasks = self.store.load_tasks().await?;
        let due: Vec<Task> = self
            .schedule
            .due_tasks(&tasks, date)
            .into_iter()
            .cloned()
            .collect();
        debug!(target: "app::tasks", %date, due = due.len(), total = tasks.len(), "due tasks resolved");
        Ok(due)
    }

    pub async fn today(&self) -> AppResult<(NaiveDate, Vec<Task>)> {
        let date = self.schedule.today();
        let tasks = self.tasks_due_on(date).await?;
        Ok((date, tasks))
    }

    /// Creates a custom task at the head of the list.
    pub async fn create_task(&self, input: TaskCreateInput) -> AppResult<Task> {
        let category = normalize_category(input.category);
        let task = Task {
            id: format!("{CUSTOM_ID_PREFIX}{}", uuid::Uuid::new_v4()),
            title: normalize_title(&input.title)?,
            icon: Some(icon_for_category(&category).to_string()),
            category,
            difficulty: normalize_difficulty(input.difficulty.unwrap_or(Difficulty::Medium))?,
            completed: false,
            status: TaskStatus::Active,
            due_date: input.due_date.unwrap_or_else(Utc::now),
            recurrence: normalize_recurrence(input.recurrence)?,
            time: normalize_time(input.time)?,
        };

        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load_tasks().await?;
        tasks.insert(0, task.clone());
        self.store.save_tasks(&tasks).await?;
        info!(target: "app::tasks", task_id = %task.id, "task created");
        Ok(task)
    }

    pub async fn update_task(&self, id: &str, update: TaskUpdateInput) -> AppResult<Task> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load_tasks().await?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(AppError::not_found)?;

        apply_update(task, update)?;
        let updated = task.clone();
        self.store.save_tasks(&tasks).await?;
        info!(target: "app::tasks", task_id = %id, "task updated");
        Ok(updated)
    }

    pub async fn delete_task(&self, id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load_tasks().await?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Err(AppError::not_found());
        }
        self.store.save_tasks(&tasks).await?;
        info!(target: "app::tasks", task_id = %id, "task deleted");
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: TaskStatus) -> AppResult<Task> {
        self.update_task(
            id,
            TaskUpdateInput {
                status: Some(status),
                ..TaskUpdateInput::default()
            },
        )
        .await
    }

    pub async fn pause_task(&self, id: &str) -> AppResult<Task> {
        self.set_status(id, TaskStatus::Paused).await
    }

    pub async fn resume_task(&self, id: &str) -> AppResult<Task> {
        self.set_status(id, TaskStatus::Active).await
    }

    /// Replaces the whole task set after validating it.
    pub async fn replace_tasks(&self, tasks: Vec<Task>) -> AppResult<()> {
        validate_task_set(&tasks).map_err(|err| match err {
            AppError::MalformedInput { message, .. } => AppError::validation(message),
            other => other,
        })?;
        let _guard = self.write_lock.lock().await;
        self.store.save_tasks(&tasks).await?;
        info!(target: "app::tasks", count = tasks.len(), "task set replaced");
        Ok(())
    }
}

fn apply_update(task: &mut Task, update: TaskUpdateInput) -> AppResult<()> {
    if let Some(title) = update.title {
        task.title = normalize_title(&title)?;
    }

    if let Some(category) = update.category {
        task.category = normalize_category(Some(category));
        task.icon = Some(icon_for_category(&task.category).to_string());
    }

    if let Some(difficulty) = update.difficulty {
        task.difficulty = normalize_difficulty(difficulty)?;
    }

    if let Some(status) = update.status {
        if status == TaskStatus::Completed {
            return Err(AppError::validation(
                "status `completed` is read-only; toggle completion instead",
            ));
        }
        task.status = status;
    }

    if let Some(due_date) = update.due_date {
        task.due_date = due_date;
    }

    if let Some(recurrence) = update.recurrence {
        task.recurrence = normalize_recurrence(recurrence)?;
    }

    if let Some(time) = update.time {
        task.time = normalize_time(time)?;
    }

    Ok(())
}

fn normalize_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_category(category: Option<String>) -> String {
    category
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

fn icon_for_category(category: &str) -> &str {
    KNOWN_CATEGORIES
        .iter()
        .copied()
        .find(|known| *known == category)
        .unwrap_or(DEFAULT_CATEGORY)
}

fn normalize_difficulty(difficulty: Difficulty) -> AppResult<Difficulty> {
    match difficulty {
        Difficulty::Unrecognized(raw) => Err(AppError::validation(format!(
            "difficulty must be Easy, Medium or Hard, got `{raw}`"
        ))),
        known => Ok(known),
    }
}

fn normalize_recurrence(recurrence: Option<Recurrence>) -> AppResult<Option<Recurrence>> {
    let Some(mut recurrence) = recurrence else {
        return Ok(None);
    };

    if recurrence.interval < 1 {
        return Err(AppError::validation("recurrence interval must be at least 1"));
    }

    if let Some(days) = recurrence.days_of_week.take() {
        if !days.is_empty() && recurrence.unit != RecurrenceUnit::Week {
            return Err(AppError::validation(
                "daysOfWeek is only allowed for weekly recurrence",
            ));
        }
        let mut unique = Vec::with_capacity(days.len());
        for day in days {
            if !unique.contains(&day) {
                unique.push(day);
            }
        }
        recurrence.days_of_week = (!unique.is_empty()).then_some(unique);
    }

    Ok(Some(recurrence))
}

fn normalize_time(time: Option<String>) -> AppResult<Option<String>> {
    let Some(value) = time else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| AppError::validation(format!("time must be HH:MM, got `{trimmed}`")))?;
    Ok(Some(parsed.format("%H:%M").to_string()))
}
