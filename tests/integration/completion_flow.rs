use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use discipline_baby_lib::error::AppError;
use discipline_baby_lib::models::pet::PetCatalog;
use discipline_baby_lib::models::task::{Difficulty, Recurrence, Task, TaskStatus, WeekdayTag};
use discipline_baby_lib::models::user::User;
use discipline_baby_lib::services::schedule::ScheduleResolver;
use discipline_baby_lib::state::AppState;
use discipline_baby_lib::storage::{DataStore, LocalStore};
use tempfile::TempDir;

fn task(id: &str, difficulty: Difficulty) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        category: "Learning".to_string(),
        icon: Some("Learning".to_string()),
        difficulty,
        completed: false,
        status: TaskStatus::Active,
        due_date: Utc::now(),
        recurrence: None,
        time: None,
    }
}

async fn setup(user: User, tasks: Vec<Task>) -> (AppState, Arc<LocalStore>, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(LocalStore::new(dir.path()).expect("local store"));
    store.save_user(&user).await.expect("seed user");
    store.save_tasks(&tasks).await.expect("seed tasks");
    let state = AppState::new(
        store.clone(),
        ScheduleResolver::default(),
        PetCatalog::default(),
        "test",
    );
    (state, store, dir)
}

#[tokio::test]
async fn complete_then_uncomplete_round_trips_xp() {
    let (state, store, _dir) = setup(
        User::default(),
        vec![task("read", Difficulty::Easy), task("homework", Difficulty::Hard)],
    )
    .await;
    let completion = state.completion();

    let first = completion.complete_task("homework", true).await.expect("complete");
    assert_eq!(first.xp_gained, 15);
    assert_eq!(store.load_user().await.expect("user").xp, 15);

    let back = completion
        .complete_task("homework", false)
        .await
        .expect("uncomplete");
    assert_eq!(back.xp_gained, -15);

    let user = store.load_user().await.expect("user");
    assert_eq!(user.xp, 0);
    assert_eq!(user.level, 1);
    let tasks = store.load_tasks().await.expect("tasks");
    assert!(tasks.iter().all(|task| !task.completed));
}

#[tokio::test]
async fn idempotent_toggles_never_change_state() {
    let (state, store, _dir) = setup(
        User {
            xp: 37,
            ..User::default()
        },
        vec![task("read", Difficulty::Medium)],
    )
    .await;
    let completion = state.completion();

    for completed in [false, false] {
        let outcome = completion
            .complete_task("read", completed)
            .await
            .expect("no-op toggle");
        assert_eq!(outcome.xp_gained, 0);
    }
    completion.complete_task("read", true).await.expect("complete");
    let after_complete = store.load_user().await.expect("user");
    let outcome = completion.complete_task("read", true).await.expect("repeat");

    assert_eq!(outcome.xp_gained, 0);
    assert_eq!(store.load_user().await.expect("user"), after_complete);
    assert_eq!(after_complete.xp, 47);
}

#[tokio::test]
async fn xp_never_goes_negative_across_sequences() {
    let tasks = vec![
        task("a", Difficulty::Easy),
        task("b", Difficulty::Medium),
        task("c", Difficulty::Hard),
    ];
    let (state, store, _dir) = setup(User::default(), tasks).await;
    let completion = state.completion();

    let script = [
        ("c", true),
        ("a", true),
        ("b", true),
        ("c", false),
        ("a", false),
        ("b", false),
        ("b", true),
        ("b", false),
        ("c", true),
    ];
    for (id, completed) in script {
        let outcome = completion.complete_task(id, completed).await.expect("toggle");
        assert!(outcome.user.xp >= 0);
        assert!(outcome.user.xp < outcome.user.xp_to_next_level);
    }

    let user = store.load_user().await.expect("user");
    assert_eq!(user.xp, 15);
}

#[tokio::test]
async fn level_up_and_pet_evolution_surface_in_outcome() {
    let (state, store, _dir) = setup(
        User {
            xp: 95,
            ..User::default()
        },
        vec![task("read", Difficulty::Medium)],
    )
    .await;

    let outcome = state
        .completion()
        .complete_task("read", true)
        .await
        .expect("complete");

    assert!(outcome.leveled_up);
    assert_eq!(outcome.levels_gained, 1);
    assert_eq!(outcome.xp_gained, -90);
    assert!(outcome.pet_evolved);
    assert_eq!(outcome.previous_pet_style, "pet1");
    assert_eq!(outcome.user.pet_style, "pet2");

    let stored = store.load_user().await.expect("user");
    assert_eq!((stored.level, stored.xp, stored.xp_to_next_level), (2, 5, 120));
}

#[tokio::test]
async fn unknown_task_leaves_files_untouched() {
    let (state, store, _dir) = setup(User::default(), vec![task("read", Difficulty::Easy)]).await;
    let before_user = store.load_user().await.expect("user");
    let before_tasks = store.load_tasks().await.expect("tasks");

    let result = state.completion().complete_task("missing", true).await;

    assert!(matches!(result, Err(AppError::NotFound)));
    assert_eq!(store.load_user().await.expect("user"), before_user);
    assert_eq!(store.load_tasks().await.expect("tasks"), before_tasks);
}

#[tokio::test]
async fn paused_task_is_rejected_until_resumed() {
    let (state, store, _dir) = setup(User::default(), vec![task("read", Difficulty::Easy)]).await;
    state.tasks().pause_task("read").await.expect("pause");

    let result = state.completion().complete_task("read", true).await;
    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert_eq!(store.load_user().await.expect("user").xp, 0);
    assert!(!store.load_tasks().await.expect("tasks")[0].completed);

    state.tasks().resume_task("read").await.expect("resume");
    let outcome = state
        .completion()
        .complete_task("read", true)
        .await
        .expect("complete after resume");
    assert_eq!(outcome.xp_gained, 5);
}

#[tokio::test]
async fn edits_through_task_service_do_not_touch_xp() {
    let (state, store, _dir) = setup(
        User {
            xp: 12,
            ..User::default()
        },
        vec![task("read", Difficulty::Easy)],
    )
    .await;

    state.completion().complete_task("read", true).await.expect("complete");
    state.tasks().pause_task("read").await.expect("pause");
    state.tasks().resume_task("read").await.expect("resume");

    let tasks = store.load_tasks().await.expect("tasks");
    assert!(tasks[0].completed);
    assert_eq!(store.load_user().await.expect("user").xp, 17);
}

fn monday() -> NaiveDate {
    let date = NaiveDate::from_ymd_opt(2025, 3, 3).expect("date");
    assert_eq!(date.weekday(), Weekday::Mon);
    date
}

#[test]
fn explicit_weekdays_ignore_interval_and_anchor() {
    let resolver = ScheduleResolver::default();
    let task = Task {
        due_date: Utc.with_ymd_and_hms(2024, 12, 25, 10, 0, 0).unwrap(),
        recurrence: Some(Recurrence {
            interval: 2,
            ..Recurrence::on_days(vec![WeekdayTag::Mon, WeekdayTag::Wed])
        }),
        ..task("dance", Difficulty::Easy)
    };

    for offset in 0..21 {
        let date = monday() + Duration::days(offset);
        let expected = matches!(date.weekday(), Weekday::Mon | Weekday::Wed);
        assert_eq!(resolver.is_due_on(&task, date), expected, "{date}");
    }
}

#[test]
fn interval_only_recurrence_counts_whole_weeks() {
    let resolver = ScheduleResolver::default();
    let task = Task {
        due_date: Utc.with_ymd_and_hms(2025, 3, 3, 23, 30, 0).unwrap(),
        recurrence: Some(Recurrence::weekly(2)),
        ..task("swim", Difficulty::Medium)
    };

    assert!(resolver.is_due_on(&task, monday()));
    assert!(!resolver.is_due_on(&task, monday() + Duration::days(7)));
    assert!(resolver.is_due_on(&task, monday() + Duration::days(14)));
    assert!(resolver.is_due_on(&task, monday() - Duration::days(14)));
    assert!(!resolver.is_due_on(&task, monday() + Duration::days(15)));
}

#[test]
fn paused_tasks_are_never_due() {
    let resolver = ScheduleResolver::default();
    let anchor = Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap();
    let variants = [
        None,
        Some(Recurrence::weekly(1)),
        Some(Recurrence::on_days(vec![
            WeekdayTag::Mon,
            WeekdayTag::Tue,
            WeekdayTag::Wed,
            WeekdayTag::Thu,
            WeekdayTag::Fri,
            WeekdayTag::Sat,
            WeekdayTag::Sun,
        ])),
    ];

    for recurrence in variants {
        let task = Task {
            status: TaskStatus::Paused,
            due_date: anchor,
            recurrence,
            ..task("paused", Difficulty::Easy)
        };
        for offset in 0..14 {
            assert!(!resolver.is_due_on(&task, monday() + Duration::days(offset)));
        }
    }
}

#[test]
fn calendar_day_follows_configured_zone() {
    // 2025-03-03T20:00Z is already Tuesday in Shanghai.
    let anchor = Utc.with_ymd_and_hms(2025, 3, 3, 20, 0, 0).unwrap();
    let task = Task {
        due_date: anchor,
        ..task("late", Difficulty::Easy)
    };

    let utc = ScheduleResolver::default();
    let shanghai = ScheduleResolver::new(Tz::Asia__Shanghai);

    assert!(utc.is_due_on(&task, monday()));
    assert!(!shanghai.is_due_on(&task, monday()));
    assert!(shanghai.is_due_on(&task, monday() + Duration::days(1)));
}
