use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::pet::PetCatalog;
use crate::models::task::TaskStatus;
use crate::models::user::User;
use crate::services::progression::{apply_xp_delta, xp_for_difficulty};
use crate::services::WriteLock;
use crate::storage::DataStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    /// Stored XP after minus stored XP before, so negative on a level-up.
    pub xp_gained: i64,
    /// Delta added before rollover: the reward, or less when the zero floor
    /// clamps it.
    pub xp_applied: i64,
    pub leveled_up: bool,
    pub levels_gained: u32,
    pub pet_evolved: bool,
    pub previous_pet_style: String,
    pub user: User,
}

impl CompletionOutcome {
    fn unchanged(user: User) -> Self {
        Self {
            xp_gained: 0,
            xp_applied: 0,
            leveled_up: false,
            levels_gained: 0,
            pet_evolved: false,
            previous_pet_style: user.pet_style.clone(),
            user,
        }
    }
}

/// Mediates completion toggles between the progression engine and a store.
///
/// Completions through one instance, and through services sharing its
/// [`WriteLock`], are serialized. Separate instances (or processes) sharing a
/// store can still overwrite each other's user writes.
pub struct CompletionService {
    store: Arc<dyn DataStore>,
    pets: PetCatalog,
    write_lock: WriteLock,
}

impl CompletionService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_pets(store, PetCatalog::default())
    }

    pub fn with_pets(store: Arc<dyn DataStore>, pets: PetCatalog) -> Self {
        Self {
            store,
            pets,
            write_lock: WriteLock::default(),
        }
    }

    pub fn pets(&self) -> &PetCatalog {
        &self.pets
    }

    pub fn write_lock(&self) -> WriteLock {
        self.write_lock.clone()
    }

    pub async fn complete_task(&self, task_id: &str, completed: bool) -> AppResult<CompletionOutcome> {
        let _guard = self.write_lock.lock().await;

        let user = self.store.load_user().await?;
        let mut tasks = self.store.load_tasks().await?;

        let index = tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(AppError::not_found)?;

        if tasks[index].status == TaskStatus::Paused {
            return Err(AppError::validation(format!("task {task_id} is paused")));
        }

        if tasks[index].completed == completed {
            info!(target: "app::completion", task_id, completed, "completion unchanged");
            return Ok(CompletionOutcome::unchanged(user));
        }

        let reward = xp_for_difficulty(&tasks[index].difficulty);
        let delta = if completed { reward } else { -reward };
        let progression = apply_xp_delta(&user, delta, &self.pets);
        let xp_gained = progression.user.xp - user.xp;

        self.store.save_user(&progression.user).await?;

        tasks[index].completed = completed;
        if let Err(err) = self.store.save_tasks(&tasks).await {
            error!(
                target: "app::completion",
                task_id,
                error = %err,
                "task write failed after user write; restoring previous user"
            );
            if let Err(restore_err) = self.store.save_user(&user).await {
                warn!(
                    target: "app::completion",
                    error = %restore_err,
                    "failed to restore previous user; xp and task flags may disagree"
                );
            }
            return Err(err);
        }

        info!(
            target: "app::completion",
            task_id,
            completed,
            xp_gained,
            xp_applied = progression.xp_applied,
            level = progression.user.level,
            "task completion recorded"
        );

        Ok(CompletionOutcome {
            xp_gained,
            xp_applied: progression.xp_applied,
            leveled_up: progression.leveled_up,
            levels_gained: progression.levels_gained,
            pet_evolved: progression.pet_evolved,
            previous_pet_style: progression.previous_pet_style,
            user: progression.user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use chrono::Utc;

    use crate::models::achievement::Achievement;
    use crate::models::task::{Difficulty, Task};
    use crate::storage::StorageProvider;

    #[derive(Default)]
    struct MemoryStore {
        user: StdMutex<User>,
        tasks: StdMutex<Vec<Task>>,
        user_writes: AtomicUsize,
        task_writes: AtomicUsize,
        fail_task_writes: AtomicBool,
    }

    impl MemoryStore {
        fn with(user: User, tasks: Vec<Task>) -> Self {
            Self {
                user: StdMutex::new(user),
                tasks: StdMutex::new(tasks),
                ..Self::default()
            }
        }

        fn user(&self) -> User {
            self.user.lock().unwrap().clone()
        }

        fn tasks(&self) -> Vec<Task> {
            self.tasks.lock().unwrap().clone()
        }

        fn writes(&self) -> (usize, usize) {
            (
                self.user_writes.load(Ordering::SeqCst),
                self.task_writes.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait::async_trait]
    impl DataStore for MemoryStore {
        async fn load_user(&self) -> AppResult<User> {
            Ok(self.user())
        }

        async fn save_user(&self, user: &User) -> AppResult<()> {
            self.user_writes.fetch_add(1, Ordering::SeqCst);
            *self.user.lock().unwrap() = user.clone();
            // Give concurrent callers a chance to interleave.
            tokio::task::yield_now().await;
            Ok(())
        }

        async fn load_tasks(&self) -> AppResult<Vec<Task>> {
            Ok(self.tasks())
        }

        async fn save_tasks(&self, tasks: &[Task]) -> AppResult<()> {
            if self.fail_task_writes.load(Ordering::SeqCst) {
                return Err(AppError::remote("write refused", Some(503)));
            }
            self.task_writes.fetch_add(1, Ordering::SeqCst);
            *self.tasks.lock().unwrap() = tasks.to_vec();
            Ok(())
        }

        async fn load_achievements(&self) -> AppResult<Vec<Achievement>> {
            Ok(Vec::new())
        }

        async fn save_achievements(&self, _achievements: &[Achievement]) -> AppResult<()> {
            Ok(())
        }

        fn provider(&self) -> StorageProvider {
            StorageProvider::Local
        }
    }

    fn task(id: &str, difficulty: Difficulty, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            category: "Learning".to_string(),
            icon: None,
            difficulty,
            completed,
            status: TaskStatus::Active,
            due_date: Utc::now(),
            recurrence: None,
            time: None,
        }
    }

    fn user_at(xp: i64, level: i64, xp_to_next_level: i64) -> User {
        User {
            xp,
            level,
            xp_to_next_level,
            ..User::default()
        }
    }

    fn setup(user: User, tasks: Vec<Task>) -> (Arc<MemoryStore>, CompletionService) {
        let store = Arc::new(MemoryStore::with(user, tasks));
        let service = CompletionService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn completing_medium_task_rolls_over_level() {
        let (store, service) = setup(
            user_at(95, 1, 100),
            vec![task("read", Difficulty::Medium, false)],
        );

        let outcome = service.complete_task("read", true).await.expect("complete");

        assert_eq!(outcome.xp_gained, -90);
        assert_eq!(outcome.xp_applied, 10);
        assert!(outcome.leveled_up);
        assert_eq!(outcome.user.level, 2);
        assert_eq!(outcome.user.xp, 5);
        assert_eq!(outcome.user.xp_to_next_level, 120);
        assert_eq!(store.user(), outcome.user);
        assert!(store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn repeated_toggle_is_a_no_op() {
        let (store, service) = setup(
            user_at(10, 1, 100),
            vec![task("read", Difficulty::Easy, false)],
        );

        service.complete_task("read", true).await.expect("first");
        let writes_after_first = store.writes();
        let second = service.complete_task("read", true).await.expect("second");

        assert_eq!(second.xp_gained, 0);
        assert!(!second.leveled_up);
        assert_eq!(store.user().xp, 15);
        assert_eq!(store.writes(), writes_after_first);
    }

    #[tokio::test]
    async fn uncomplete_reverses_reward() {
        let (store, service) = setup(
            user_at(20, 2, 120),
            vec![task("homework", Difficulty::Hard, true)],
        );

        let outcome = service
            .complete_task("homework", false)
            .await
            .expect("uncomplete");

        assert_eq!(outcome.xp_gained, -15);
        assert_eq!(store.user().xp, 5);
        assert_eq!(store.user().level, 2);
        assert!(!store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn uncomplete_reports_clamped_gain() {
        let (store, service) = setup(
            user_at(3, 4, 172),
            vec![task("homework", Difficulty::Hard, true)],
        );

        let outcome = service
            .complete_task("homework", false)
            .await
            .expect("uncomplete");

        assert_eq!(outcome.xp_gained, -3);
        assert_eq!(outcome.xp_applied, -3);
        assert_eq!(store.user().xp, 0);
        assert_eq!(store.user().level, 4);
    }

    #[tokio::test]
    async fn unknown_task_is_not_found_and_writes_nothing() {
        let (store, service) = setup(User::default(), vec![task("read", Difficulty::Easy, false)]);

        let result = service.complete_task("ghost", true).await;

        assert!(matches!(result, Err(AppError::NotFound)));
        assert_eq!(store.writes(), (0, 0));
    }

    #[tokio::test]
    async fn paused_task_cannot_be_completed() {
        let mut bike = task("bike", Difficulty::Hard, false);
        bike.status = TaskStatus::Paused;
        let (store, service) = setup(user_at(0, 1, 100), vec![bike]);

        let result = service.complete_task("bike", true).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert_eq!(store.writes(), (0, 0));
        assert_eq!(store.user().xp, 0);
        assert!(!store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn paused_task_cannot_be_uncompleted() {
        let mut bike = task("bike", Difficulty::Hard, true);
        bike.status = TaskStatus::Paused;
        let (store, service) = setup(user_at(20, 1, 100), vec![bike]);

        let result = service.complete_task("bike", false).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert_eq!(store.writes(), (0, 0));
        assert!(store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn unrecognized_difficulty_flips_flag_without_xp() {
        let (store, service) = setup(
            user_at(7, 1, 100),
            vec![task("legacy", Difficulty::Unrecognized("Epic".into()), false)],
        );

        let outcome = service.complete_task("legacy", true).await.expect("complete");

        assert_eq!(outcome.xp_gained, 0);
        assert_eq!(store.user().xp, 7);
        assert!(store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn failed_task_write_restores_user() {
        let before = user_at(40, 1, 100);
        let (store, service) = setup(
            before.clone(),
            vec![task("read", Difficulty::Hard, false)],
        );
        store.fail_task_writes.store(true, Ordering::SeqCst);

        let result = service.complete_task("read", true).await;

        assert!(matches!(result, Err(AppError::Remote { .. })));
        assert_eq!(store.user(), before);
        assert!(!store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn concurrent_completions_through_one_service_both_count() {
        let (store, service) = setup(
            user_at(0, 1, 100),
            vec![
                task("read", Difficulty::Easy, false),
                task("workout", Difficulty::Medium, false),
            ],
        );

        let (first, second) = futures::join!(
            service.complete_task("read", true),
            service.complete_task("workout", true)
        );
        first.expect("first completion");
        second.expect("second completion");

        assert_eq!(store.user().xp, 15);
        assert!(store.tasks().iter().all(|task| task.completed));
    }

    #[tokio::test]
    async fn separate_services_can_lose_updates() {
        // Two instances over one store do not share a lock; the later user
        // write is computed from a stale read.
        let store = Arc::new(MemoryStore::with(
            user_at(0, 1, 100),
            vec![
                task("read", Difficulty::Easy, false),
                task("workout", Difficulty::Medium, false),
            ],
        ));

        let stale = store.load_user().await.expect("stale read");
        CompletionService::new(store.clone())
            .complete_task("read", true)
            .await
            .expect("first completion");
        let overwritten = apply_xp_delta(&stale, 10, &PetCatalog::default());
        store
            .save_user(&overwritten.user)
            .await
            .expect("stale write");

        assert_eq!(store.user().xp, 10);
    }
}
