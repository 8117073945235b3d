use std::path::Path;
use std::sync::Arc;

use discipline_baby_lib::config::AppConfig;
use discipline_baby_lib::db::DbPool;
use discipline_baby_lib::error::AppError;
use discipline_baby_lib::models::pet::PetCatalog;
use discipline_baby_lib::models::user::User;
use discipline_baby_lib::services::completion_service::CompletionService;
use discipline_baby_lib::services::progression::apply_xp_delta;
use discipline_baby_lib::storage::{
    build_store, DataStore, DatabaseStore, LocalStore, StorageProvider, DATABASE_FILE,
};

fn local(dir: &Path) -> Arc<dyn DataStore> {
    Arc::new(LocalStore::new(dir).expect("local store"))
}

fn database(dir: &Path) -> Arc<dyn DataStore> {
    let pool = DbPool::new(dir.join(DATABASE_FILE)).expect("db pool");
    Arc::new(DatabaseStore::new(pool))
}

async fn assert_store_contract(store: Arc<dyn DataStore>) {
    assert_eq!(store.load_user().await.expect("default user"), User::default());

    let tasks = store.load_tasks().await.expect("seed tasks");
    assert_eq!(tasks.len(), 6);
    assert_eq!(store.load_tasks().await.expect("stable seed"), tasks);

    let achievements = store.load_achievements().await.expect("seed achievements");
    assert!(!achievements.is_empty());

    let user = User {
        name: "Mia".into(),
        xp: 30,
        level: 3,
        xp_to_next_level: 144,
        ..User::default()
    };
    store.save_user(&user).await.expect("save user");
    assert_eq!(store.load_user().await.expect("reload user"), user);

    let mut edited = tasks.clone();
    edited.truncate(2);
    edited[0].completed = true;
    store.save_tasks(&edited).await.expect("save tasks");
    assert_eq!(store.load_tasks().await.expect("reload tasks"), edited);
}

#[tokio::test]
async fn local_store_honours_contract() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = local(dir.path());
    assert_eq!(store.provider(), StorageProvider::Local);
    assert_store_contract(store).await;
}

#[tokio::test]
async fn database_store_honours_contract() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = database(dir.path());
    assert_eq!(store.provider(), StorageProvider::Database);
    assert_store_contract(store).await;
}

#[tokio::test]
async fn build_store_resolves_configured_provider() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = AppConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();

    config.storage.provider = StorageProvider::Database;
    let store = build_store(&config).expect("db store");
    assert_eq!(store.provider(), StorageProvider::Database);
    assert!(dir.path().join(DATABASE_FILE).exists());

    config.storage.provider = StorageProvider::RemoteKv;
    let store = build_store(&config).expect("kv store");
    assert_eq!(store.provider(), StorageProvider::RemoteKv);
}

#[tokio::test]
async fn malformed_tasks_file_fails_closed() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("habit-heroes-tasks.json"),
        r#"[{"id":"read","difficulty":"Easy","status":"active","dueDate":"not a date"}]"#,
    )
    .expect("write corrupt file");
    let store = local(dir.path());

    assert!(matches!(
        store.load_tasks().await,
        Err(AppError::MalformedInput { .. })
    ));

    let completion = CompletionService::new(store);
    assert!(matches!(
        completion.complete_task("read", true).await,
        Err(AppError::MalformedInput { .. })
    ));
}

#[tokio::test]
async fn separate_orchestrators_on_one_database_can_lose_updates() {
    // Two processes sharing a database file: each holds its own lock, so an
    // interleaved read-modify-write drops the first user write.
    let dir = tempfile::tempdir().expect("temp dir");
    let process_a = CompletionService::new(database(dir.path()));
    let store_b = database(dir.path());

    let tasks = store_b.load_tasks().await.expect("seed");
    let read_id = tasks
        .iter()
        .find(|task| task.id == "read")
        .map(|task| task.id.clone())
        .expect("seeded read task");

    let stale_user = store_b.load_user().await.expect("stale read");
    process_a
        .complete_task(&read_id, true)
        .await
        .expect("process a completes");
    let clobber = apply_xp_delta(&stale_user, 10, &PetCatalog::default());
    store_b.save_user(&clobber.user).await.expect("process b writes");

    let user = store_b.load_user().await.expect("final user");
    assert_eq!(user.xp, 10, "the easy task's 5 XP was lost");
}
