use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::models::pet::PetCatalog;
use crate::services::achievement_service::AchievementService;
use crate::services::completion_service::CompletionService;
use crate::services::schedule::ScheduleResolver;
use crate::services::task_service::TaskService;
use crate::services::user_service::UserService;
use crate::storage::{build_store, DataStore};

/// Services wired to one store. Every service shares the completion write
/// lock, so task edits and completions never interleave within a process.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DataStore>,
    task_service: Arc<TaskService>,
    user_service: Arc<UserService>,
    achievement_service: Arc<AchievementService>,
    completion_service: Arc<CompletionService>,
    environment: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        schedule: ScheduleResolver,
        pets: PetCatalog,
        environment: impl Into<String>,
    ) -> Self {
        let completion_service = Arc::new(CompletionService::with_pets(Arc::clone(&store), pets));
        let write_lock = completion_service.write_lock();

        let task_service = Arc::new(TaskService::new(
            Arc::clone(&store),
            schedule,
            write_lock.clone(),
        ));
        let user_service = Arc::new(UserService::new(Arc::clone(&store), write_lock.clone()));
        let achievement_service = Arc::new(AchievementService::new(Arc::clone(&store), write_lock));

        Self {
            store,
            task_service,
            user_service,
            achievement_service,
            completion_service,
            environment: environment.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let store = build_store(config)?;
        let schedule = ScheduleResolver::new(config.timezone()?);
        Ok(Self::new(
            store,
            schedule,
            PetCatalog::default(),
            config.server.environment.clone(),
        ))
    }

    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    pub fn tasks(&self) -> Arc<TaskService> {
        Arc::clone(&self.task_service)
    }

    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.user_service)
    }

    pub fn achievements(&self) -> Arc<AchievementService> {
        Arc::clone(&self.achievement_service)
    }

    pub fn completion(&self) -> Arc<CompletionService> {
        Arc::clone(&self.completion_service)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }
}
